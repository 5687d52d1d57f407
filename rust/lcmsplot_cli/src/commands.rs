use tracing::info;

use crate::cli::{
    PlotArgs,
    WriteTemplateArgs,
};
use crate::config::Config;
use crate::error::CliError;
use crate::processing::process_datasets;

pub fn main_plot(args: PlotArgs) -> Result<(), CliError> {
    let config = Config::from_args(&args)?;
    info!("Parsed configuration: {:#?}", config);

    let summaries = process_datasets(&args.inputs, &config)?;
    for summary in summaries.iter() {
        println!("{}", summary);
    }
    println!(
        "Wrote outputs for {} dataset(s) to {}",
        summaries.len(),
        config.output.directory.display()
    );
    Ok(())
}

pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    if let Some(parent) = args.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.output_path, Config::template_json()?)?;
    println!(
        "Wrote configuration template to: {}",
        args.output_path.display()
    );
    Ok(())
}
