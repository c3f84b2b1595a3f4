//! CSV allocation report.
//!
//! One row per instrument in dashboard order. Window columns hold the
//! window score, or stay blank when the window was skipped.

use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::error::DcaError;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

fn report_err(e: impl std::fmt::Display) -> DcaError {
    DcaError::Report {
        reason: e.to_string(),
    }
}

impl CsvReportAdapter {
    pub fn render(snapshot: &DashboardSnapshot) -> Result<String, DcaError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());

        let window_labels: Vec<String> = snapshot
            .instruments
            .first()
            .map(|s| s.score.windows.iter().map(|w| w.window.label.clone()).collect())
            .unwrap_or_default();

        let mut header = vec![
            "name".to_string(),
            "ticker".to_string(),
            "date".to_string(),
            "latest".to_string(),
            "change_pct".to_string(),
            "raw_score".to_string(),
            "adjusted_score".to_string(),
            "allocation_pct".to_string(),
        ];
        header.extend(window_labels.iter().cloned());
        wtr.write_record(&header).map_err(report_err)?;

        for summary in &snapshot.instruments {
            let (date, latest) = match summary.latest {
                Some(p) => (p.date.to_string(), format!("{:.4}", p.value)),
                None => (String::new(), String::new()),
            };
            let mut row = vec![
                summary.instrument.name.clone(),
                summary.instrument.ticker.clone(),
                date,
                latest,
                format!("{:.4}", summary.daily_change_pct),
                format!("{:.2}", summary.score.raw_score),
                format!("{:.2}", summary.adjusted_score),
                format!("{:.4}", summary.allocation_pct),
            ];
            for label in &window_labels {
                let cell = summary
                    .score
                    .window(label)
                    .and_then(|w| w.score())
                    .map(|s| format!("{:+.1}", s))
                    .unwrap_or_default();
                row.push(cell);
            }
            wtr.write_record(&row).map_err(report_err)?;
        }

        let bytes = wtr.into_inner().map_err(report_err)?;
        String::from_utf8(bytes).map_err(report_err)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, snapshot: &DashboardSnapshot, output_path: &str) -> Result<(), DcaError> {
        let content = Self::render(snapshot)?;
        std::fs::write(output_path, content)?;
        log::info!("Report written to: {}", output_path);
        Ok(())
    }
}
