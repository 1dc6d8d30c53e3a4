use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use optical_configurator::config::Settings;
use optical_configurator::report::{self, SessionReport};
use optical_configurator::state::validation::{CameraForm, LensForm};
use optical_configurator::state::{CatalogRepository, Field, JsonCatalog, Session};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "optical-configurator")]
#[command(about = "Solve working distance, focal length and field of view for a camera/lens pair")]
#[command(version)]
struct Cli {
    /// Directory holding cameras.json and objectives.json.
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    /// Settings file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cameras in the catalog.
    Cameras,

    /// List lenses in the catalog.
    Lenses,

    /// Add a camera to the catalog.
    AddCamera(AddCameraArgs),

    /// Add a lens to the catalog.
    AddLens(AddLensArgs),

    /// Solve one configuration and print the result.
    Solve(SolveArgs),

    /// Interactive session reading commands from stdin.
    Shell,
}

#[derive(Debug, Clone, Args)]
struct AddCameraArgs {
    #[arg(long)]
    name: String,
    /// Horizontal resolution (px).
    #[arg(long)]
    resolution_x: String,
    /// Vertical resolution (px).
    #[arg(long)]
    resolution_y: String,
    /// Pixel size (µm).
    #[arg(long)]
    pixel_size: String,
    /// Shutter type (global, rolling, ...).
    #[arg(long, default_value = "")]
    shutter: String,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Debug, Clone, Args)]
struct AddLensArgs {
    #[arg(long)]
    name: String,
    /// Focal length (mm).
    #[arg(long)]
    focal_length: String,
    /// Mount (C, CS, M12, ...).
    #[arg(long, default_value = "")]
    mount: String,
    /// Maximum image circle (mm).
    #[arg(long)]
    max_image_circle: String,
    /// Aperture, as an f-number or free text.
    #[arg(long, default_value = "")]
    aperture: String,
}

#[derive(Debug, Clone, Args)]
struct SolveArgs {
    /// Camera name (defaults to the first camera in the catalog).
    #[arg(long)]
    camera: Option<String>,

    /// Lens name; its focal length is locked.
    #[arg(long)]
    lens: Option<String>,

    /// Working distance (mm).
    #[arg(long)]
    wd: Option<String>,

    /// Focal length (mm).
    #[arg(long)]
    focal: Option<String>,

    /// Field of view (mm).
    #[arg(long)]
    fov: Option<String>,

    /// Fields to lock, comma separated (wd, focal, fov).
    #[arg(long, value_delimiter = ',')]
    lock: Vec<Field>,

    /// Object speed (m/s), for motion blur.
    #[arg(long, requires = "exposure")]
    speed: Option<f64>,

    /// Exposure time (s), for motion blur.
    #[arg(long, requires = "speed")]
    exposure: Option<f64>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.catalog_dir {
        settings.catalog_dir = Some(dir);
    }
    let mut catalog = JsonCatalog::open(settings.catalog_dir())?;

    match cli.command {
        Commands::Cameras => run_cameras(&catalog),
        Commands::Lenses => run_lenses(&catalog),
        Commands::AddCamera(args) => run_add_camera(&mut catalog, &args),
        Commands::AddLens(args) => run_add_lens(&mut catalog, &args),
        Commands::Solve(args) => run_solve(&catalog, settings, &args),
        Commands::Shell => run_shell(&catalog, settings),
    }
}

// ── listings ───────────────────────────────────────────────────────────

fn run_cameras(catalog: &JsonCatalog) -> CliResult<()> {
    let cameras = catalog.load_cameras()?;
    if cameras.is_empty() {
        println!("No cameras found in {}", catalog.camera_path().display());
        return Ok(());
    }
    for cam in cameras.iter() {
        println!(
            "{:<24} {:>5} × {:<5} px  {:>6.3} µm  {:>7.3} × {:<7.3} mm  {}",
            cam.name,
            cam.resolution_x,
            cam.resolution_y,
            cam.pixel_size_um,
            cam.sensor_width_mm(),
            cam.sensor_height_mm(),
            cam.shutter,
        );
    }
    Ok(())
}

fn run_lenses(catalog: &JsonCatalog) -> CliResult<()> {
    let lenses = catalog.load_lenses()?;
    if lenses.is_empty() {
        println!("No lenses found in {}", catalog.lens_path().display());
        return Ok(());
    }
    for lens in lenses.iter() {
        println!(
            "{:<24} {:>7.2} mm  {:<6} circle {:>6.2} mm  {}",
            lens.name, lens.focal_length_mm, lens.mount, lens.max_image_circle_mm, lens.aperture,
        );
    }
    Ok(())
}

// ── add-camera / add-lens ──────────────────────────────────────────────

fn run_add_camera(catalog: &mut JsonCatalog, args: &AddCameraArgs) -> CliResult<()> {
    let form = CameraForm {
        name: args.name.clone(),
        resolution_x: args.resolution_x.clone(),
        resolution_y: args.resolution_y.clone(),
        pixel_size_um: args.pixel_size.clone(),
        shutter: args.shutter.clone(),
        notes: args.notes.clone(),
    };
    let camera = form.parse()?;
    let name = camera.name.clone();
    catalog.add_camera(camera)?;
    println!("✅ Camera '{}' added", name);
    Ok(())
}

fn run_add_lens(catalog: &mut JsonCatalog, args: &AddLensArgs) -> CliResult<()> {
    let form = LensForm {
        name: args.name.clone(),
        focal_length: args.focal_length.clone(),
        mount: args.mount.clone(),
        max_image_circle: args.max_image_circle.clone(),
        aperture: args.aperture.clone(),
    };
    let lens = form.parse()?;
    let name = lens.name.clone();
    catalog.add_lens(lens)?;
    println!("✅ Lens '{}' added", name);
    Ok(())
}

// ── solve ──────────────────────────────────────────────────────────────

fn run_solve(catalog: &JsonCatalog, settings: Settings, args: &SolveArgs) -> CliResult<()> {
    let mut session = Session::from_repository(catalog, settings)?;

    if let Some(name) = &args.camera {
        session.select_camera(name)?;
    }
    for (field, text) in [(Field::Wd, &args.wd), (Field::Focal, &args.focal), (Field::Fov, &args.fov)] {
        if let Some(text) = text {
            session.commit_text(field, text)?;
        }
    }
    for &field in &args.lock {
        if !session.locks().get(field) {
            session.toggle_lock(field)?;
        }
    }
    if let Some(name) = &args.lens {
        session.select_lens(name)?;
    }
    if let (Some(speed), Some(exposure)) = (args.speed, args.exposure) {
        session.set_motion(speed, exposure)?;
    }

    if args.json {
        let report = SessionReport::from_session(&session);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render(&session));
    }
    Ok(())
}

// ── shell ──────────────────────────────────────────────────────────────

/// One line of the interactive shell
#[derive(Debug, Clone, PartialEq)]
enum ShellCommand {
    Camera(String),
    Lens(String),
    Set(Field, String),
    Clear(Field),
    Lock(Field),
    Motion(f64, f64),
    MotionOff,
    Reset,
    Reload,
    Show,
    Cameras,
    Lenses,
    Help,
    Quit,
}

impl ShellCommand {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        let field = |s: &str| s.parse::<Field>();
        let need = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", cmd, what))
            } else {
                Ok(rest.to_string())
            }
        };

        match cmd.to_ascii_lowercase().as_str() {
            "camera" => need("a camera name").map(ShellCommand::Camera),
            "lens" => need("a lens name").map(ShellCommand::Lens),
            "set" => {
                let (name, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: set <wd|focal|fov> <value>".to_string())?;
                Ok(ShellCommand::Set(field(name)?, value.trim().to_string()))
            }
            "clear" => Ok(ShellCommand::Clear(field(&need("a field")?)?)),
            "lock" => Ok(ShellCommand::Lock(field(&need("a field")?)?)),
            "motion" => {
                if rest.eq_ignore_ascii_case("off") {
                    return Ok(ShellCommand::MotionOff);
                }
                let mut parts = rest.split_whitespace().map(str::parse::<f64>);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Ok(speed)), Some(Ok(exposure)), None) => {
                        Ok(ShellCommand::Motion(speed, exposure))
                    }
                    _ => Err("usage: motion <speed m/s> <exposure s> | motion off".to_string()),
                }
            }
            "reset" => Ok(ShellCommand::Reset),
            "reload" => Ok(ShellCommand::Reload),
            "show" | "" => Ok(ShellCommand::Show),
            "cameras" => Ok(ShellCommand::Cameras),
            "lenses" => Ok(ShellCommand::Lenses),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

const SHELL_HELP: &str = "\
commands:
  camera <name>             select a camera
  lens <name>               select a lens (locks focal)
  set <wd|focal|fov> <mm>   commit a field value
  clear <wd|focal|fov>      clear a field
  lock <wd|focal|fov>       toggle a lock
  motion <m/s> <s>          object speed and exposure
  motion off                clear motion inputs
  reset                     back to defaults
  reload                    re-read the catalogs
  show                      print the current state
  cameras | lenses          list the catalogs
  quit";

fn run_shell(catalog: &JsonCatalog, settings: Settings) -> CliResult<()> {
    let mut session = Session::from_repository(catalog, settings)?;
    println!("{}", SHELL_HELP);
    print!("{}", report::render(&session));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("⚠️  {}", msg);
                continue;
            }
        };

        let result = match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{}", SHELL_HELP);
                continue;
            }
            ShellCommand::Cameras => run_cameras(catalog),
            ShellCommand::Lenses => run_lenses(catalog),
            ShellCommand::Show => Ok(()),
            ShellCommand::Reload => session
                .reload(catalog)
                .and_then(|_| session.reset().map(|_| ()))
                .map_err(Into::into),
            ShellCommand::Camera(name) => session.select_camera(&name).map(|_| ()).map_err(Into::into),
            ShellCommand::Lens(name) => session.select_lens(&name).map(|_| ()).map_err(Into::into),
            ShellCommand::Set(field, value) => {
                session.commit_text(field, &value).map(|_| ()).map_err(Into::into)
            }
            ShellCommand::Clear(field) => session.commit_text(field, "").map(|_| ()).map_err(Into::into),
            ShellCommand::Lock(field) => session.toggle_lock(field).map(|_| ()).map_err(Into::into),
            ShellCommand::Motion(speed, exposure) => {
                session.set_motion(speed, exposure).map(|_| ()).map_err(Into::into)
            }
            ShellCommand::MotionOff => session.clear_motion().map(|_| ()).map_err(Into::into),
            ShellCommand::Reset => session.reset().map(|_| ()).map_err(Into::into),
        };

        match result {
            Ok(()) => print!("{}", report::render(&session)),
            Err(e) => println!("⚠️  {}", e),
        }
    }

    Ok(())
}
