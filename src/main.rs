use paramtree::{cli, AppConfig, AppError, Station};

fn run(args: &[String]) -> Result<(), AppError> {
    let options = cli::parse_args(args)?;
    let config = AppConfig::from_env()?;
    let station = Station::build(&config)?;
    println!("{}", station.render(&options, &config)?);
    Ok(())
}

fn main() {
    // Cargar .env si existe antes de leer la configuración
    let _ = dotenvy::dotenv();
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("[paramtree] {e}");
        std::process::exit(match e {
                               AppError::Usage(_) => 2,
                               _ => 1,
                           });
    }
}
