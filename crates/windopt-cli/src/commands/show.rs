use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;
use tabwriter::TabWriter;

use windopt_cli::common::{format_indices, loader_for, resolve_library, write_json, OutputFormat};
use windopt_cli::config::WindoptSettings;
use windopt_core::{
    ConfigurationModel, Constraint, DesignVariable, DriverSettings, GeneralSettings,
    MeritFigure, RecorderSettings,
};

#[derive(Serialize)]
struct Summary<'a> {
    merit_figures: &'a [MeritFigure],
    components: Vec<&'a str>,
    general: &'a GeneralSettings,
    design_variables: Vec<&'a DesignVariable>,
    constraints: Vec<&'a Constraint>,
    driver: &'a DriverSettings,
    recorder: &'a RecorderSettings,
}

pub fn handle(
    config: &Path,
    component: Option<&str>,
    format: OutputFormat,
    library: Option<&Path>,
    settings: &WindoptSettings,
) -> Result<()> {
    let model = loader_for(resolve_library(library, settings)?).load_path(config)?;
    if let Some(component) = component {
        if !model.components().contains(&component) {
            bail!(
                "component '{component}' not found; configuration has: {}",
                model.components().join(", ")
            );
        }
    }

    let summary = Summary {
        merit_figures: &model.merit_figures,
        components: model.components(),
        general: &model.general,
        design_variables: model
            .design_variables
            .iter()
            .filter(|dv| component.map_or(true, |c| dv.component() == c))
            .collect(),
        constraints: model
            .constraints
            .iter()
            .filter(|c| component.map_or(true, |name| c.component() == name))
            .collect(),
        driver: &model.driver,
        recorder: &model.recorder,
    };

    match format {
        OutputFormat::Table => print_summary(&model, &summary),
        OutputFormat::Json => Ok(write_json(&summary, &mut io::stdout(), true)?),
    }
}

fn print_summary(model: &ConfigurationModel, summary: &Summary<'_>) -> Result<()> {
    let merit = match model.merit_figure() {
        Some(figure) if figure.is_maximized() => format!("{figure} (maximized)"),
        Some(figure) => format!("{figure} (minimized)"),
        None if model.merit_figures.is_empty() => "none selected".to_string(),
        None => format!("{} selected", model.merit_figures.len()),
    };
    println!("Merit figure: {merit}");
    println!("Components: {}", summary.components.join(", "));

    let opt = &model.driver.optimization;
    println!(
        "Optimization: {} ({}), tol {:e}, max_iter {}, {} differences, step {:e}",
        opt.solver,
        if opt.flag { "active" } else { "inactive" },
        opt.tol,
        opt.max_iter,
        opt.form.as_str(),
        opt.step_size
    );
    if let Some(doe) = &model.driver.design_of_experiments {
        println!(
            "Design of experiments: {} ({}), {} samples",
            doe.generator.as_str(),
            if doe.flag { "active" } else { "inactive" },
            doe.num_samples
        );
    }
    match (&model.recorder.file_name, model.recorder.flag) {
        (Some(file), true) => println!("Recorder: {file}"),
        _ => println!("Recorder: off"),
    }
    println!();

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "DESIGN VARIABLE\tACTIVE\tBOUNDS\tN_OPT\tINDICES")?;
    for dv in &summary.design_variables {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            dv.path,
            yes_no(dv.flag),
            dv.bounds,
            dv.n_opt.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
            format_indices(dv.index_start, dv.index_end)
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "CONSTRAINT\tACTIVE\tBOUND\tINDICES")?;
    for constraint in &summary.constraints {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            constraint.path,
            yes_no(constraint.flag),
            constraint.bound,
            format_indices(constraint.index_start, constraint.index_end)
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
