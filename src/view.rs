//! View boundary for the sync coordinator.
//!
//! The coordinator never touches output directly; it talks to a
//! `ViewSink` injected at construction. The binary provides the
//! line-oriented `TerminalView`, tests provide a recording double.

use crate::models::Currency;

/// Everything the view needs to present one applied conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionDisplay {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub amount_from: f64,
    pub amount_to: f64,
}

pub trait ViewSink: Send + Sync {
    /// Replace the rendered set of currency choices.
    fn render_currencies(&self, currencies: &[Currency]);

    /// Present an applied conversion.
    fn render_conversion(&self, conversion: &ConversionDisplay);

    /// Transient, non-fatal notice.
    fn show_notification(&self, message: &str);

    /// Online/offline indicator.
    fn set_connectivity(&self, online: bool);
}

/// Line-oriented view used by the CLI binary.
pub struct TerminalView;

impl ViewSink for TerminalView {
    fn render_currencies(&self, currencies: &[Currency]) {
        println!("{} currencies available (try `list` to see them all)", currencies.len());
    }

    fn render_conversion(&self, conversion: &ConversionDisplay) {
        println!(
            "{} {} = {} {}   (1 {} = {} {})",
            conversion.amount_from,
            conversion.from,
            conversion.amount_to,
            conversion.to,
            conversion.from,
            conversion.rate,
            conversion.to,
        );
    }

    fn show_notification(&self, message: &str) {
        println!("* {}", message);
    }

    fn set_connectivity(&self, online: bool) {
        if online {
            println!("[online]");
        } else {
            println!("[offline]");
        }
    }
}
