//! Turns live-stream events into printer commands and budget credits.

use log::info;

use crate::command;
use crate::printer::PrinterHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct Gift
{
    pub name: String,
    pub diamond_count: u32,
    pub repeat_count: Option<u32>,
    pub streakable: bool,
    pub streaking: bool
}

impl Gift
{
    /// Budget units this gift is worth, None while a streak is still
    /// running (the final event of the streak carries the total count).
    pub fn credit(&self, ratio: f64) -> Option<f64>
    {
        if self.streakable && self.streaking {
            return None;
        }
        let count = self.repeat_count.unwrap_or(1).max(1);
        Some(count as f64 * self.diamond_count as f64 * ratio)
    }
}

/// First word of a comment, lowercased, if it names a command
pub fn comment_command(comment: &str) -> Option<String>
{
    let word = comment.split_whitespace().next()?.to_lowercase();
    if command::is_command(&word) {
        Some(word)
    } else {
        None
    }
}

pub struct EventRouter
{
    printer: PrinterHandle,
    gift_ratio: f64
}

impl EventRouter
{
    pub fn new(printer: PrinterHandle, gift_ratio: f64) -> EventRouter
    {
        EventRouter { printer, gift_ratio }
    }

    /// Returns true when the comment was queued as a command
    pub fn on_comment(&self, user: &str, comment: &str) -> bool
    {
        match comment_command(comment) {
            Some(cmd) => {
                let accepted = self.printer.enqueue(&cmd);
                if accepted {
                    info!("Movement command from {}: {}", user, cmd);
                }
                accepted
            },
            None => false
        }
    }

    /// Returns the amount credited
    pub fn on_gift(&self, user: &str, gift: &Gift) -> Option<f64>
    {
        let credit = gift.credit(self.gift_ratio)?;
        let total = self.printer.credit_budget(credit);
        info!("Gift from {}: {} worth {} filament units. Total: {}",
              user, gift.name, credit, total);
        Some(credit)
    }
}
