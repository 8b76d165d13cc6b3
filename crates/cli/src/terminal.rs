use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use fogsim_core::TaskClass;
use fogsim_sim::SimulationReport;
use std::io::{self, Write};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const LABEL: Color = Color::Cyan;
    const GOOD: Color = Color::Green;
    const BAD: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Renders run reports to stdout.
#[derive(Default)]
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    fn header(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("{text}\n")),
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", "-".repeat(text.len().max(48)))),
            ResetColor,
        )?;
        Ok(())
    }

    fn row(&self, label: &str, value: String) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::LABEL),
            Print(format!("  {label:<28}")),
            ResetColor,
            Print(format!("{value}\n")),
        )?;
        Ok(())
    }

    /// Print the summary of a single run.
    pub fn print_report(&self, report: &SimulationReport) -> Result<()> {
        self.header(&format!(
            "fogsim [{}] {} steps, run {}",
            report.policy, report.steps, report.run_id
        ))?;
        self.row("generated", report.total_generated.to_string())?;
        self.row("admitted", report.total_admitted.to_string())?;
        self.row("completed", report.total_completed.to_string())?;
        self.row("dropped", report.total_dropped.to_string())?;
        self.row("rejected (deadline)", report.total_rejected.to_string())?;
        self.row("outstanding", report.outstanding.to_string())?;
        let completion_ratio = report.completion_ratio.map(pct).unwrap_or_else(|| "-".into());
        self.row("completion ratio", completion_ratio)?;
        self.row("admission rate", pct(report.admission_rate))?;
        self.row("avg latency (s)", opt(report.avg_latency, 3))?;
        self.row("max latency (s)", opt(report.max_latency, 3))?;
        self.row("emergency avg latency (s)", opt(report.emergency_avg_latency, 3))?;
        self.row("other avg latency (s)", opt(report.non_emergency_avg_latency, 3))?;
        self.row("avg queue length", opt(report.avg_queue_length, 2))?;

        for (reason, count) in &report.drop_reasons {
            self.row(&format!("drops: {reason}"), count.to_string())?;
        }

        let mut stdout = io::stdout();
        for class in TaskClass::ALL {
            let Some(summary) = report.class(class) else {
                continue;
            };
            let color = if summary.deadline_met_rate >= 0.9 {
                Colors::GOOD
            } else {
                Colors::BAD
            };
            execute!(
                stdout,
                SetForegroundColor(Colors::LABEL),
                Print(format!("  {:<28}", format!("{class} deadlines met"))),
                SetForegroundColor(color),
                Print(format!(
                    "{} ({}/{})\n",
                    pct(summary.deadline_met_rate),
                    summary.deadline_met,
                    summary.deadline_met + summary.deadline_violated
                )),
                ResetColor,
            )?;
        }

        for node in &report.nodes {
            if let Some(w) = node.weights {
                self.row(
                    &format!("node {} weights", node.id),
                    format!("a={:.3} b={:.3} g={:.3}", w.alpha, w.beta, w.gamma),
                )?;
            }
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print one row per policy.
    pub fn print_comparison(&self, reports: &[SimulationReport]) -> Result<()> {
        self.header("policy comparison")?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::LABEL),
            Print(format!(
                "  {:<16} {:>9} {:>9} {:>8} {:>8} {:>10} {:>10} {:>10}\n",
                "policy",
                "completed",
                "dropped",
                "rejected",
                "ratio",
                "avg lat",
                "emerg lat",
                "emerg met"
            )),
            ResetColor,
        )?;
        for r in reports {
            let emergency_met = r
                .class(TaskClass::Emergency)
                .map(|c| pct(c.deadline_met_rate))
                .unwrap_or_else(|| "-".into());
            execute!(
                stdout,
                Print(format!(
                    "  {:<16} {:>9} {:>9} {:>8} {:>8} {:>10} {:>10} {:>10}\n",
                    r.policy.as_str(),
                    r.total_completed,
                    r.total_dropped,
                    r.total_rejected,
                    r.completion_ratio.map(pct).unwrap_or_else(|| "-".into()),
                    opt(r.avg_latency, 3),
                    opt(r.emergency_avg_latency, 3),
                    emergency_met,
                )),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }
}
