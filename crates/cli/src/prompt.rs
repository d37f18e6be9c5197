//! Operator prompts backing the calibration workflow.

use contracts::{CapturePrompt, ReferencePoint, ScanError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Interactive prompt reading confirmation lines from stdin.
pub struct StdinPrompt {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl CapturePrompt for StdinPrompt {
    async fn confirm_capture(&mut self, index: usize) -> Result<(), ScanError> {
        println!(
            "Position the stylus on reference point {} and press Enter to capture...",
            index + 1
        );
        match self.lines.next_line().await? {
            Some(_) => Ok(()),
            None => Err(ScanError::configuration(
                "stdin closed while waiting for capture confirmation",
            )),
        }
    }

    fn point_captured(&mut self, point: &ReferencePoint) {
        println!(
            "  ✓ point {} captured at ({:.2}, {:.2}, {:.2})",
            point.index + 1,
            point.pos.x,
            point.pos.y,
            point.pos.z
        );
    }
}

/// Non-interactive prompt that captures every point immediately.
///
/// Used with `--auto-capture`, mainly for mock-tracker runs.
pub struct AutoPrompt;

impl CapturePrompt for AutoPrompt {
    async fn confirm_capture(&mut self, index: usize) -> Result<(), ScanError> {
        println!("Capturing reference point {} (auto)", index + 1);
        Ok(())
    }

    fn point_captured(&mut self, point: &ReferencePoint) {
        println!(
            "  ✓ point {} captured at ({:.2}, {:.2}, {:.2})",
            point.index + 1,
            point.pos.x,
            point.pos.y,
            point.pos.z
        );
    }
}
