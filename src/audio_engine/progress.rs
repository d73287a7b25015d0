use crate::audio_engine::constants::PROGRESS_MIN_INTERVAL_MS;
use crate::messages::ConversionEvent;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversionStage {
    Decimating,
    Quantizing,
    Publishing,
}

impl ConversionStage {
    pub fn stage_label(self) -> &'static str {
        match self {
            Self::Decimating => "decimating",
            Self::Quantizing => "quantizing",
            Self::Publishing => "publishing",
        }
    }

    fn range(self) -> (f32, f32) {
        match self {
            Self::Decimating => (0.0, 0.4),
            Self::Quantizing => (0.4, 0.95),
            Self::Publishing => (0.95, 1.0),
        }
    }
}

/// Stage-local progress reported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionProgress {
    pub stage: ConversionStage,
    pub percent: f32,
}

/// Throttled progress publisher for one conversion generation.
pub struct ProgressReporter {
    generation: u64,
    tx: Sender<ConversionEvent>,
    last_emit: Instant,
    min_interval: Duration,
}

impl ProgressReporter {
    pub fn new(generation: u64, tx: Sender<ConversionEvent>) -> Self {
        let min_interval = Duration::from_millis(PROGRESS_MIN_INTERVAL_MS);
        Self {
            generation,
            tx,
            last_emit: Instant::now()
                .checked_sub(min_interval)
                .unwrap_or_else(Instant::now),
            min_interval,
        }
    }

    /// Publish `update`, mapped onto the whole pipeline's 0..=1 range.
    ///
    /// Updates at a stage boundary (0 or 1) are always sent; others are dropped if the
    /// previous event went out less than the throttle interval ago.
    pub fn emit(&mut self, update: ConversionProgress) {
        let local_percent = if update.percent.is_finite() {
            update.percent.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let force = local_percent <= 0.0 || local_percent >= 1.0;

        let now = Instant::now();
        if !force && now.duration_since(self.last_emit) < self.min_interval {
            return;
        }
        self.last_emit = now;

        let (start, end) = update.stage.range();
        let percent = if local_percent >= 1.0 {
            end
        } else {
            (start + (end - start) * local_percent).clamp(0.0, 1.0)
        };
        let stage = format!("Converting ({})", update.stage.stage_label());
        let _ = self.tx.send(ConversionEvent::Progress {
            generation: self.generation,
            percent,
            stage,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn progress(stage: ConversionStage, percent: f32) -> ConversionProgress {
        ConversionProgress { stage, percent }
    }

    #[test]
    fn test_stage_boundaries_map_to_total_progress() {
        let (tx, rx) = mpsc::channel();
        let mut reporter = ProgressReporter::new(9, tx);

        reporter.emit(progress(ConversionStage::Decimating, 0.0));
        reporter.emit(progress(ConversionStage::Quantizing, 1.0));
        reporter.emit(progress(ConversionStage::Publishing, 1.0));

        let events: Vec<ConversionEvent> = rx.try_iter().collect();
        let percents: Vec<f32> = events
            .iter()
            .map(|event| match event {
                ConversionEvent::Progress { percent, .. } => *percent,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(percents, vec![0.0, 0.95, 1.0]);
        assert!(events.iter().all(|event| event.generation() == 9));
    }

    #[test]
    fn test_stage_completion_reports_exact_stage_end() {
        for stage in [
            ConversionStage::Decimating,
            ConversionStage::Quantizing,
            ConversionStage::Publishing,
        ] {
            let (tx, rx) = mpsc::channel();
            let mut reporter = ProgressReporter::new(1, tx);

            reporter.emit(progress(stage, 1.0));

            match rx.try_recv().unwrap() {
                ConversionEvent::Progress { percent, .. } => assert_eq!(percent, stage.range().1),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn test_intermediate_updates_are_throttled() {
        let (tx, rx) = mpsc::channel();
        let mut reporter = ProgressReporter::new(1, tx);

        reporter.emit(progress(ConversionStage::Quantizing, 0.1));
        reporter.emit(progress(ConversionStage::Quantizing, 0.2));
        reporter.emit(progress(ConversionStage::Quantizing, 0.3));

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_stage_label_in_event() {
        let (tx, rx) = mpsc::channel();
        let mut reporter = ProgressReporter::new(2, tx);

        reporter.emit(progress(ConversionStage::Decimating, f32::NAN));

        match rx.try_recv().unwrap() {
            ConversionEvent::Progress { stage, percent, .. } => {
                assert_eq!(stage, "Converting (decimating)");
                assert_eq!(percent, 0.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
