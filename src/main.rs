use std::path::PathBuf;

use anyhow::*;
use structopt::StructOpt;

use argon_thumbnail::{ArgonSceneExporter, ExportParameters};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "argon-thumbnail",
    about = "Render a thumbnail of an Argon visualisation document"
)]
struct Opt {
    /// Argon document to export
    #[structopt(parse(from_os_str))]
    document: PathBuf,

    /// Directory the thumbnail is written to
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    output: PathBuf,

    /// File name prefix, the thumbnail is `<prefix>_thumbnail.jpeg`
    #[structopt(short, long)]
    prefix: Option<String>,

    /// Export parameters JSON file
    #[structopt(long, parse(from_os_str))]
    parameters: Option<PathBuf>,

    #[structopt(long)]
    initial_time: Option<f64>,

    #[structopt(long)]
    finish_time: Option<f64>,

    #[structopt(long)]
    time_steps: Option<u32>,

    /// More output per occurrence
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

impl Opt {
    fn export_parameters(&self) -> Result<ExportParameters> {
        let mut parameters = match &self.parameters {
            Some(path) => ExportParameters::from_file(path)
                .with_context(|| format!("can't use parameters '{}'", path.display()))?,
            None => ExportParameters::default(),
        };
        if let Some(prefix) = &self.prefix {
            parameters.prefix = prefix.clone();
        }
        if self.initial_time.is_some() {
            parameters.initial_time = self.initial_time;
        }
        if self.finish_time.is_some() {
            parameters.finish_time = self.finish_time;
        }
        if let Some(steps) = self.time_steps {
            parameters.number_of_time_steps = steps;
        }
        Ok(parameters)
    }
}

fn init_logger(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logger(opt.verbose);

    let parameters = opt.export_parameters()?;
    let mut exporter = ArgonSceneExporter::new(Some(opt.output.clone()), None);
    exporter.set_parameters(parameters);
    exporter.set_filename(opt.document.clone());

    let begin_time = std::time::Instant::now();
    let path = exporter
        .export(None)
        .with_context(|| format!("can't export '{}'", opt.document.display()))?;

    log::info!("finished in {:?}", begin_time.elapsed());
    println!("{}", path.display());
    Ok(())
}
