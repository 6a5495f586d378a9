use anyhow::{bail, Context, Result};
use tracing::info;

use ascent_metrics::aggregate::average_spectrum;
use ascent_metrics::config::Config;
use ascent_metrics::export::export_summary_csv;
use ascent_metrics::metrics::{Deltas, Fft, Highpass, Lowpass};
use ascent_metrics::pipeline::{aggregate_run, run_spectra, Inference, StandardMetrics};

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut inference_dir = None;
    let mut csv_path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--csv" if i + 1 < args.len() => {
                csv_path = Some(args[i + 1].clone());
                i += 2;
            }
            arg if inference_dir.is_none() => {
                inference_dir = Some(arg.to_string());
                i += 1;
            }
            arg => bail!("不明な引数: {arg}"),
        }
    }

    let Some(inference_dir) = inference_dir else {
        println!("ascent-metrics {}", env!("GIT_VERSION"));
        println!();
        println!("使い方: ascent-metrics <推論ディレクトリ> [--csv <出力先>]");
        println!();
        println!("推論ディレクトリの metadata.json と run_*.json を読み、");
        println!("標準メトリクスを計算してラン単位・推論単位の集約を表示します。");
        return Ok(());
    };

    let config = Config::load_or_default(CONFIG_PATH);
    info!(version = env!("GIT_VERSION"), fps = config.capture.fps, "ascent-metrics 起動");

    let mut inference = Inference::load(&inference_dir)
        .with_context(|| format!("推論ディレクトリの読み込みに失敗: {inference_dir}"))?;

    println!(
        "推論: {} | {} | ラン数 {}",
        inference.metadata.name,
        inference.metadata.timestamp.format("%d.%m.%Y %H:%M:%S"),
        inference.runs.len()
    );

    let lowpass_params = config.metrics.lowpass_parameters();
    let highpass_params = config.metrics.highpass_parameters();

    let mut per_run = Vec::new();
    let mut spectra = Vec::new();
    for run in &mut inference.runs {
        let skipped = StandardMetrics::calculate(run);
        let record = aggregate_run(run, skipped);

        println!();
        println!("ラン {:02}:", run.id);
        for (name, entry) in &record.entries {
            let values = entry
                .values
                .iter()
                .map(|v| format!("{v:.3}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {name}: {values}");
        }
        for skip in &record.skipped {
            println!("  スキップ: {} / {} ({})", skip.feature, skip.metric, skip.reason);
        }

        // 標準プリセットのフィルタによる概況
        let mut hf_features = 0usize;
        let mut smoothed_travel = Vec::new();
        for feature in run.features.iter().filter(|f| f.values_interp.is_some()) {
            if let Ok(hp) = Highpass::calculate(feature, &highpass_params) {
                if hp.values_smoothed.is_some() {
                    hf_features += 1;
                }
            }
            if let Ok(lp) = Lowpass::calculate(feature, &lowpass_params) {
                smoothed_travel.push(Deltas::calculate(&lp).sum_abs);
            }
        }
        println!("  高周波イベントを含む特徴量: {hf_features}");
        if !smoothed_travel.is_empty() {
            let mean = smoothed_travel.iter().sum::<f64>() / smoothed_travel.len() as f64;
            println!("  平滑化後の移動量平均: {mean:.3}");
        }

        spectra.extend(run_spectra(run));
        per_run.push((format!("run {:02}", run.id), record));
    }

    let run_refs: Vec<&ascent_metrics::aggregate::AggregationRecord> =
        per_run.iter().map(|(_, r)| r).collect();
    let inference_record = ascent_metrics::aggregate::aggregate_records(&run_refs);

    println!();
    println!("推論全体:");
    for (name, entry) in &inference_record.entries {
        let values = entry
            .values
            .iter()
            .map(|v| format!("{v:.3}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {name}: {values}");
    }

    if !spectra.is_empty() {
        let spectrum_refs: Vec<&Fft> = spectra.iter().collect();
        let (freqs, averaged) = average_spectrum(&spectrum_refs, &config.spectrum);
        if let Some((peak_index, peak)) = averaged
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
        {
            println!();
            println!(
                "平均スペクトルのピーク: {:.1} Hz (振幅 {:.3}, 特徴量 {} 本)",
                freqs[peak_index],
                peak,
                spectra.len()
            );
        }
    }

    if let Some(csv_path) = csv_path {
        let mut rows: Vec<(&str, &ascent_metrics::aggregate::AggregationRecord)> = per_run
            .iter()
            .map(|(scope, record)| (scope.as_str(), record))
            .collect();
        rows.push(("inference", &inference_record));
        export_summary_csv(&csv_path, &rows)
            .with_context(|| format!("CSVの書き出しに失敗: {csv_path}"))?;
        println!();
        println!("CSVを書き出しました: {csv_path}");
    }

    Ok(())
}
