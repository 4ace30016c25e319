use glassops_core::freeze::active_window;
use glassops_core::plugin::has_whitelist;
use glassops_core::{ConfigSource, PolicyEngine};
use serde::Serialize;

use crate::cli::args::CheckArgs;
use crate::exit_codes;

#[derive(Debug, Serialize)]
struct PluginVerdict {
    name: String,
    allowed: bool,
    version_constraint: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    config: String,
    default_unsafe: bool,
    frozen: bool,
    freeze_window: Option<String>,
    whitelist_configured: bool,
    plugins: Vec<PluginVerdict>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<i32> {
    let engine = PolicyEngine::for_workspace(&args.workspace);
    let loaded = match engine.load_with_source() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let config = &loaded.config;

    let window = active_window(config, engine.now());
    let plugins: Vec<PluginVerdict> = args
        .plugins
        .iter()
        .map(|name| PluginVerdict {
            name: name.clone(),
            allowed: engine.is_plugin_allowed(config, name),
            version_constraint: engine.plugin_version_constraint(config, name),
        })
        .collect();

    let report = CheckReport {
        config: match &loaded.source {
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::DefaultUnsafe => "<default unsafe>".to_string(),
        },
        default_unsafe: loaded.is_default_unsafe(),
        frozen: window.is_some(),
        freeze_window: window.map(|w| format!("{} {}-{}", w.day, w.start, w.end)),
        whitelist_configured: has_whitelist(config),
        plugins,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(if report.frozen {
        exit_codes::FROZEN
    } else if report.plugins.iter().any(|p| !p.allowed) {
        exit_codes::RUN_FAILED
    } else {
        exit_codes::SUCCESS
    })
}

fn print_text(report: &CheckReport) {
    println!("config: {}", report.config);
    match &report.freeze_window {
        Some(window) => println!("freeze: FROZEN ({})", window),
        None => println!("freeze: open"),
    }
    if !report.whitelist_configured {
        println!("whitelist: none (all plugins allowed)");
    }
    for plugin in &report.plugins {
        let verdict = if plugin.allowed { "allowed" } else { "rejected" };
        match &plugin.version_constraint {
            Some(constraint) => println!("plugin {}: {} ({})", plugin.name, verdict, constraint),
            None => println!("plugin {}: {}", plugin.name, verdict),
        }
    }
}
