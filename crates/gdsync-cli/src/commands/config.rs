//! Config command - show and validate configuration

use anyhow::Result;
use clap::Subcommand;

use crate::output::{Output, OutputFormat};
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx, format),
            ConfigCommand::Validate => self.execute_validate(ctx, format),
        }
    }

    fn execute_show(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let out = Output::new(format);

        if out.is_json() {
            let value = serde_json::json!({
                "path": ctx.config_path.display().to_string(),
                "exists": ctx.config_path.exists(),
                "config": serde_json::to_value(&ctx.config)?,
            });
            out.document(&value)?;
            return Ok(());
        }

        if !ctx.config_path.exists() {
            out.warn(&format!(
                "{} not found, showing defaults",
                ctx.config_path.display()
            ));
        }
        out.success(&format!("Configuration ({})", ctx.config_path.display()));
        let yaml = serde_yaml::to_string(&ctx.config)?;
        for line in yaml.lines() {
            out.detail(line);
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let out = Output::new(format);
        let errors = ctx.config.validate();

        if out.is_json() {
            let list: Vec<_> = errors
                .iter()
                .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
                .collect();
            out.document(&serde_json::json!({
                "valid": errors.is_empty(),
                "errors": list,
            }))?;
        } else if errors.is_empty() {
            out.success("Configuration is valid");
        } else {
            for error in &errors {
                out.error(&error.to_string());
            }
        }

        if !errors.is_empty() {
            anyhow::bail!("configuration has {} error(s)", errors.len());
        }
        Ok(())
    }
}
