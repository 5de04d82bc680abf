use super::data::{CaptureMetadata, TraceEvent};
use crate::cancel::CancellationContext;
use serde::Serialize;

/// Statistics over the loaded capture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    pub total_events: usize,
    pub draws: usize,
    pub dispatches: usize,
    pub clears: usize,
    pub copies: usize,
    pub barriers: usize,
    pub submits: usize,
    pub markers: usize,
    pub components: usize,
    pub capture_bytes: u64,
}

impl CaptureStats {
    /// True for the value served while no result is available
    pub fn is_empty(&self) -> bool {
        *self == CaptureStats::default()
    }

    fn count(&mut self, event: TraceEvent) {
        self.total_events += 1;
        let counter = match event {
            TraceEvent::Draw => &mut self.draws,
            TraceEvent::Dispatch => &mut self.dispatches,
            TraceEvent::Clear => &mut self.clears,
            TraceEvent::Copy => &mut self.copies,
            TraceEvent::Barrier => &mut self.barriers,
            TraceEvent::Submit => &mut self.submits,
            TraceEvent::Marker => &mut self.markers,
        };
        *counter += 1;
    }
}

/// Cancellable statistics pass
#[derive(Debug, Clone)]
pub struct TraceStats {
    poll_stride: usize,
}

impl Default for TraceStats {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl TraceStats {
    pub fn new(poll_stride: usize) -> Self {
        Self {
            poll_stride: poll_stride.max(1),
        }
    }

    /// Count `events`, checking `context` every `poll_stride` events.
    ///
    /// Returns `None` when cancelled; partial counts are dropped.
    pub fn gather(
        &self,
        context: &CancellationContext,
        metadata: CaptureMetadata,
        events: &[TraceEvent],
    ) -> Option<CaptureStats> {
        let mut stats = CaptureStats {
            components: metadata.components,
            capture_bytes: metadata.capture_bytes,
            ..CaptureStats::default()
        };

        for chunk in events.chunks(self.poll_stride) {
            if context.is_cancelled() {
                return None;
            }
            for &event in chunk {
                stats.count(event);
            }
        }

        if context.is_cancelled() {
            return None;
        }
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind() {
        let events = [
            TraceEvent::Marker,
            TraceEvent::Draw,
            TraceEvent::Draw,
            TraceEvent::Dispatch,
            TraceEvent::Barrier,
            TraceEvent::Submit,
        ];
        let metadata = CaptureMetadata {
            components: 2,
            capture_bytes: 4096,
        };

        let stats = TraceStats::new(2)
            .gather(&CancellationContext::background(), metadata, &events)
            .unwrap();

        assert_eq!(stats.total_events, 6);
        assert_eq!(stats.draws, 2);
        assert_eq!(stats.dispatches, 1);
        assert_eq!(stats.barriers, 1);
        assert_eq!(stats.submits, 1);
        assert_eq!(stats.markers, 1);
        assert_eq!(stats.clears, 0);
        assert_eq!(stats.components, 2);
        assert_eq!(stats.capture_bytes, 4096);
    }

    #[test]
    fn test_cancelled_returns_none() {
        let ctx = CancellationContext::new();
        ctx.cancel();
        let events = vec![TraceEvent::Draw; 10];

        assert!(TraceStats::new(4)
            .gather(&ctx, CaptureMetadata::default(), &events)
            .is_none());
    }

    #[test]
    fn test_cancelled_with_no_events() {
        let ctx = CancellationContext::new();
        ctx.cancel();
        assert!(TraceStats::default()
            .gather(&ctx, CaptureMetadata::default(), &[])
            .is_none());
    }

    #[test]
    fn test_empty_capture() {
        let stats = TraceStats::default()
            .gather(&CancellationContext::new(), CaptureMetadata::default(), &[])
            .unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn test_zero_stride_is_clamped() {
        let events = vec![TraceEvent::Copy; 3];
        let stats = TraceStats::new(0)
            .gather(&CancellationContext::new(), CaptureMetadata::default(), &events)
            .unwrap();
        assert_eq!(stats.copies, 3);
    }
}
