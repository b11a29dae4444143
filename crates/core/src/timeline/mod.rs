//! Fixed-duration show timelines.
//!
//! A show visits its items in order, wrapping around, and gives every item
//! the same time slot no matter how complex its drawing is. Within a slot the
//! item's reveal animation plays first and its static cycle repeats for the
//! rest.

use crate::{Result, ScopeError, Signal};

/// One image in a show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowItem {
    /// One refresh cycle of the finished image.
    pub cycle: Signal,
    /// Optional reveal animation played at the start of each slot.
    pub animation: Option<Signal>,
}

impl ShowItem {
    pub fn new(cycle: Signal) -> Self {
        Self {
            cycle,
            animation: None,
        }
    }

    pub fn with_animation(mut self, animation: Signal) -> Self {
        self.animation = Some(animation);
        self
    }
}

/// Lays out `items` across exactly `floor(total_duration * sample_rate)`
/// samples, one `interval`-second slot per visit.
///
/// An animation longer than its slot is cut short; the final slot is cut
/// wherever the timeline ends. Errors only when `items` is empty.
pub fn synthesize_show(
    items: &[ShowItem],
    interval: f64,
    total_duration: f64,
    sample_rate: u32,
) -> Result<Signal> {
    if items.is_empty() {
        return Err(ScopeError::EmptyShowInput);
    }

    let total = seconds_to_samples(total_duration, sample_rate);
    let slot = seconds_to_samples(interval, sample_rate);
    if slot == 0 {
        tracing::warn!(interval, "show interval is shorter than one sample, rendering silence");
        return Ok(Signal::silence(total));
    }

    let mut show = Vec::with_capacity(total);
    let mut visit = 0usize;
    while show.len() < total {
        let item = &items[visit % items.len()];
        let mut budget = slot.min(total - show.len());

        if let Some(animation) = item.animation.as_ref().filter(|a| !a.is_empty()) {
            let played = animation.len().min(budget);
            show.extend_from_slice(&animation.samples()[..played]);
            budget -= played;
        }

        if budget > 0 {
            show.extend(item.cycle.tiled(budget).into_samples());
        }

        visit += 1;
    }

    tracing::debug!(
        visits = visit,
        items = items.len(),
        samples = show.len(),
        "composed show"
    );
    Ok(Signal::new(show))
}

/// `floor(seconds * sample_rate)`, clamped at zero.
pub fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    let samples = (seconds * f64::from(sample_rate)).floor();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StereoSample;
    use pretty_assertions::assert_eq;

    fn constant(len: usize, value: f32) -> Signal {
        Signal::new(vec![StereoSample { x: value, y: -value }; len])
    }

    fn xs(signal: &Signal) -> Vec<f32> {
        signal.left()
    }

    #[test]
    fn items_wrap_around() {
        let items = [
            ShowItem::new(constant(100, 1.0)),
            ShowItem::new(constant(100, 2.0)),
        ];
        let show = synthesize_show(&items, 1.0, 3.0, 100).unwrap();

        assert_eq!(show.len(), 300);
        let mut expected = vec![1.0; 100];
        expected.extend(vec![2.0; 100]);
        expected.extend(vec![1.0; 100]);
        assert_eq!(xs(&show), expected);
    }

    #[test]
    fn length_is_exact_for_any_item_count() {
        for count in 1..5 {
            let items: Vec<ShowItem> = (0..count)
                .map(|i| ShowItem::new(constant(7 + i, i as f32)))
                .collect();
            let show = synthesize_show(&items, 0.375, 2.5, 1000).unwrap();
            assert_eq!(show.len(), 2500);
        }
    }

    #[test]
    fn static_cycle_is_tiled_within_slot() {
        let ramp: Signal = (0..3)
            .map(|i| StereoSample {
                x: i as f32,
                y: 0.0,
            })
            .collect();
        let show = synthesize_show(&[ShowItem::new(ramp)], 0.05, 0.08, 100).unwrap();

        assert_eq!(xs(&show), vec![0.0, 1.0, 2.0, 0.0, 1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn animation_plays_before_static_cycle() {
        let item = ShowItem::new(constant(4, 1.0)).with_animation(constant(3, 9.0));
        let show = synthesize_show(&[item], 0.1, 0.2, 100).unwrap();

        let mut expected = vec![9.0; 3];
        expected.extend(vec![1.0; 7]);
        expected.extend(vec![9.0; 3]);
        expected.extend(vec![1.0; 7]);
        assert_eq!(xs(&show), expected);
    }

    #[test]
    fn long_animation_is_cut_to_slot() {
        let first = ShowItem::new(constant(4, 1.0)).with_animation(constant(50, 9.0));
        let second = ShowItem::new(constant(4, 2.0));
        let show = synthesize_show(&[first, second], 0.1, 0.25, 100).unwrap();

        let mut expected = vec![9.0; 10];
        expected.extend(vec![2.0; 10]);
        expected.extend(vec![9.0; 5]);
        assert_eq!(xs(&show), expected);
    }

    #[test]
    fn empty_cycle_fills_with_silence() {
        let items = [
            ShowItem::new(Signal::default()),
            ShowItem::new(constant(2, 1.0)),
        ];
        let show = synthesize_show(&items, 0.5, 1.0, 10).unwrap();
        assert_eq!(xs(&show), vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = synthesize_show(&[], 1.0, 1.0, 100).unwrap_err();
        assert!(matches!(err, ScopeError::EmptyShowInput));
    }

    #[test]
    fn zero_slot_renders_silence() {
        let show = synthesize_show(&[ShowItem::new(constant(4, 1.0))], 0.0, 0.5, 100).unwrap();
        assert_eq!(show, Signal::silence(50));
    }
}
