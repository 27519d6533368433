//! Extract command - produce a draft from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use isemri_core::models::{ExtractedDraft, ItemKind, PipelineConfig, Provenance};
use isemri_core::{ExtractionPipeline, OllamaClient, SourceKind, TesseractEngine};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Declared source kind (default: from extension)
    #[arg(short, long)]
    kind: Option<String>,

    /// Skip model-assisted extraction, use only deterministic rules
    #[arg(long)]
    no_llm: bool,

    /// Include the truncated raw OCR text in the output
    #[arg(long)]
    raw_text: bool,

    /// Show field-group confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = if let Some(path) = config_path {
        PipelineConfig::from_file(std::path::Path::new(path))?
    } else {
        PipelineConfig::default()
    };
    if args.no_llm {
        config.llm.enabled = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let kind = match &args.kind {
        Some(declared) => SourceKind::parse(declared)?,
        None => {
            let extension = args
                .input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            SourceKind::from_extension(extension)
        }
    };

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    pb.set_message("Reading document...");
    let data = fs::read(&args.input)?;

    pb.set_message("Building pipeline...");
    let mut pipeline = ExtractionPipeline::new(config.clone(), Box::new(TesseractEngine::new()));
    if config.llm.enabled {
        match OllamaClient::new(&config.llm) {
            Ok(client) => pipeline = pipeline.with_generator(Box::new(client)),
            Err(e) => anyhow::bail!("cannot build generation client: {}", e),
        }
    }

    pb.set_message("Extracting...");
    let outcome = pipeline.extract(&data, kind, args.raw_text);
    pb.finish_with_message("Done");

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome.draft)?,
        OutputFormat::Text => format_summary(&outcome.draft),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if let Some(raw) = &outcome.raw_text {
        println!();
        println!("{}", style("Raw text:").bold());
        println!("{}", raw);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Customer confidence: {:.0}%",
            style("ℹ").blue(),
            outcome.draft.customer.confidence * 100.0
        );
        println!(
            "{} Vehicle confidence: {:.0}%",
            style("ℹ").blue(),
            outcome.draft.vehicle.confidence * 100.0
        );
    }

    if !outcome.draft.low_confidence.is_empty() {
        println!(
            "{} Review needed: {}",
            style("⚠").yellow(),
            outcome.draft.low_confidence.join(", ")
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_summary(draft: &ExtractedDraft) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Müşteri: {} ({:?})\n",
        draft.customer.name, draft.customer.kind
    ));
    if let Some(phone) = &draft.customer.phone {
        out.push_str(&format!("Telefon: {}\n", phone));
    }

    out.push_str(&format!(
        "Plaka:   {}\n",
        draft.vehicle.plate.as_deref().unwrap_or("-")
    ));
    if let (Some(brand), model) = (&draft.vehicle.brand, &draft.vehicle.model) {
        out.push_str(&format!(
            "Araç:    {} {}\n",
            brand,
            model.as_deref().unwrap_or("")
        ));
    }
    if let Some(km) = draft.vehicle.km {
        out.push_str(&format!("Km:      {}\n", km));
    }
    out.push_str(&format!("Tarih:   {}\n", draft.started_at.date_naive()));

    out.push_str("\nKalemler:\n");
    for item in &draft.items {
        let marker = match item.kind {
            ItemKind::Labor => "işçilik",
            ItemKind::Part => "parça",
        };
        out.push_str(&format!(
            "  {} x{} - {} ({})\n",
            item.name, item.qty, item.unit_price, marker
        ));
    }

    if let Some(total) = draft.totals.grand_total {
        out.push_str(&format!("\nGenel Toplam: {}\n", total));
    }

    let source = match &draft.provenance {
        Provenance::RuleBased => "kural tabanlı".to_string(),
        Provenance::ModelAssisted { model } => format!("model destekli ({})", model),
    };
    out.push_str(&format!("Kaynak: {}\n", source));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use isemri_core::models::ItemGuess;
    use rust_decimal::Decimal;

    #[test]
    fn test_summary_contains_key_fields() {
        let mut draft = ExtractedDraft::empty(Utc::now());
        draft.vehicle.plate = Some("34ABC123".to_string());
        draft.items.push(ItemGuess {
            kind: ItemKind::Part,
            name: "Yağ filtresi".to_string(),
            qty: 2,
            unit_price: Decimal::new(7500, 2),
        });
        draft.totals.grand_total = Some(Decimal::new(30000, 2));

        let summary = format_summary(&draft);
        assert!(summary.contains("34ABC123"));
        assert!(summary.contains("Yağ filtresi x2"));
        assert!(summary.contains("Genel Toplam: 300.00"));
        assert!(summary.contains("kural tabanlı"));
    }
}
