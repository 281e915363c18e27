use indicatif::{ProgressBar, ProgressStyle};
use seamblend_core::pipeline::{BlendStage, ProgressReporter};

/// Drives one indicatif bar from pipeline stage events.
pub struct BarReporter {
    bar: ProgressBar,
    images: usize,
}

impl BarReporter {
    pub fn new(images: usize) -> anyhow::Result<Self> {
        let bar = ProgressBar::new(images as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:32} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { bar, images })
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: BlendStage, item: Option<usize>) {
        match stage {
            BlendStage::Loading | BlendStage::Writing => {
                if let Some(n) = item {
                    self.bar.set_length(n as u64);
                }
                self.bar.set_position(0);
                self.bar.set_message(stage.to_string());
            }
            BlendStage::Deghosting => self.bar.set_message(stage.to_string()),
            BlendStage::Done => {
                self.bar.set_position(self.images as u64);
                self.bar.set_message(stage.to_string());
            }
            _ => {
                self.bar.set_length(self.images as u64);
                match item {
                    Some(layer) => self.bar.set_message(format!("{stage} #{}", layer + 1)),
                    None => self.bar.set_message(stage.to_string()),
                }
            }
        }
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }
}
