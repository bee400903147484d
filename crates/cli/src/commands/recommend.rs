use std::fs;
use std::io::Read;
use std::path::Path;

use dramwise_agent::{HttpCompletionTransport, RecommendationPipeline};
use dramwise_core::config::{AppConfig, LoadOptions};
use dramwise_core::{Catalog, PipelineError, PreferenceInput};

use crate::commands::CommandResult;

const COMMAND: &str = "recommend";

pub fn run(payload_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let raw = match read_payload(payload_path) {
        Ok(raw) => raw,
        Err(message) => return CommandResult::failure(COMMAND, "payload_read", message, 2),
    };

    let input: PreferenceInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(error) => {
            return CommandResult::failure(COMMAND, "payload_parse", error.to_string(), 2)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let result = runtime.block_on(async {
        let transport = HttpCompletionTransport::new(&config.completion)?;
        let pipeline =
            RecommendationPipeline::new(&config.completion, Catalog::builtin(), transport);
        pipeline.run(&input).await
    });

    match result {
        Ok(outcome) => {
            let output = serde_json::to_string_pretty(&outcome.envelope)
                .unwrap_or_else(|_| outcome.envelope.to_string());
            CommandResult { exit_code: 0, output }
        }
        Err(error) => {
            let class = match &error {
                PipelineError::Validation(_) => "request_validation",
                PipelineError::Configuration(_) => "configuration",
                PipelineError::UpstreamExhausted(_) => "upstream_exhausted",
            };
            CommandResult::failure(COMMAND, class, error.to_string(), 1)
        }
    }
}

fn read_payload(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|error| format!("could not read payload file `{}`: {error}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|error| format!("could not read payload from stdin: {error}"))?;
            Ok(buffer)
        }
    }
}
