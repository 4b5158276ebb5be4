//! Per-modality EMA smoothing with a three-part hysteresis gate
//!
//! Each tick the raw breakdown is folded into an exponential moving average.
//! The reported label only changes when all of these hold:
//!
//! 1. the minimum dwell time has elapsed since the last switch,
//! 2. the challenger leads the current label's smoothed share by the switch
//!    gap, or its own share reaches the absolute floor,
//! 3. the challenger beats the runner-up by the clear margin.
//!
//! Time comes from the caller's capture timestamps, never the wall clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SmoothingConfig;
use crate::types::{Breakdown, Label};

/// Result of one smoothing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "L: Serialize", deserialize = "L: Deserialize<'de>"))]
pub struct SmoothedReading<L: Label> {
    /// Label to report this tick
    pub label: L,
    /// Smoothed share of the reported label, floored and capped
    pub confidence: f64,
    /// Smoothed breakdown
    pub breakdown: Breakdown<L>,
    /// Whether the reported label changed on this tick
    pub switched: bool,
}

/// EMA + hysteresis state for one modality of one session
#[derive(Debug, Clone)]
pub struct ModalitySmoother<L: Label> {
    config: SmoothingConfig,
    ema: Option<Breakdown<L>>,
    emitted: Option<L>,
    last_switch: Option<DateTime<Utc>>,
}

impl<L: Label> ModalitySmoother<L> {
    /// Create a smoother
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            ema: None,
            emitted: None,
            last_switch: None,
        }
    }

    /// Currently reported label
    pub fn current(&self) -> Option<L> {
        self.emitted
    }

    /// Current smoothed breakdown
    pub fn smoothed(&self) -> Option<&Breakdown<L>> {
        self.ema.as_ref()
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.ema = None;
        self.emitted = None;
        self.last_switch = None;
    }

    /// Fold in a raw breakdown captured at `at`
    pub fn update(&mut self, raw: &Breakdown<L>, at: DateTime<Utc>) -> SmoothedReading<L> {
        let ema = match &self.ema {
            Some(prev) => prev.blend(raw, self.config.alpha),
            None => raw.clone(),
        };
        let (top, top_share) = ema.top();

        let (label, switched) = match self.emitted {
            None => (top, true),
            Some(current) if current == top => (current, false),
            Some(_) if !self.config.hysteresis => (top, true),
            Some(current) => {
                if self.may_switch(&ema, current, top_share, at) {
                    (top, true)
                } else {
                    (current, false)
                }
            }
        };

        if switched {
            tracing::trace!(
                from = ?self.emitted,
                to = ?label,
                share = top_share,
                "Smoothed label switched"
            );
            self.last_switch = Some(at);
        }
        self.emitted = Some(label);

        let floor = self.config.confidence_floor.clamp(0.0, 100.0);
        let confidence = ema.get(label).round().clamp(floor, 100.0);
        self.ema = Some(ema.clone());

        SmoothedReading {
            label,
            confidence,
            breakdown: ema,
            switched,
        }
    }

    fn may_switch(&self, ema: &Breakdown<L>, current: L, top_share: f64, at: DateTime<Utc>) -> bool {
        let dwell_ok = self
            .last_switch
            .map(|t| at - t >= self.config.min_dwell())
            .unwrap_or(true);
        let lead_ok = top_share - ema.get(current) >= self.config.switch_gap
            || top_share >= self.config.absolute_floor;
        let margin_ok = top_share - ema.second_share() >= self.config.clear_margin;
        dwell_ok && lead_ok && margin_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VoiceTone;
    use chrono::Duration;

    fn only(tone: VoiceTone) -> Breakdown<VoiceTone> {
        Breakdown::from_scores(VoiceTone::ALL.iter().map(|t| (*t, if *t == tone { 1.0 } else { 0.0 })))
    }

    #[test]
    fn test_first_reading_is_accepted() {
        let mut smoother = ModalitySmoother::new(SmoothingConfig::default());
        let reading = smoother.update(&only(VoiceTone::Tired), Utc::now());
        assert_eq!(reading.label, VoiceTone::Tired);
        assert!(reading.switched);
        assert_eq!(reading.confidence, 100.0);
    }

    #[test]
    fn test_dwell_time_delays_switch() {
        let t0 = Utc::now();
        let mut smoother = ModalitySmoother::new(SmoothingConfig::default());
        smoother.update(&only(VoiceTone::Calm), t0);

        let stressed = only(VoiceTone::Stressed);
        let r1 = smoother.update(&stressed, t0 + Duration::seconds(1));
        assert_eq!(r1.label, VoiceTone::Calm);
        let r2 = smoother.update(&stressed, t0 + Duration::seconds(2));
        // EMA already favours stressed but the dwell time has not elapsed
        assert_eq!(r2.breakdown.top().0, VoiceTone::Stressed);
        assert_eq!(r2.label, VoiceTone::Calm);
        let r3 = smoother.update(&stressed, t0 + Duration::seconds(3));
        assert_eq!(r3.label, VoiceTone::Calm);
        let r4 = smoother.update(&stressed, t0 + Duration::seconds(4));
        assert_eq!(r4.label, VoiceTone::Stressed);
        assert!(r4.switched);
    }

    #[test]
    fn test_near_tie_does_not_switch() {
        let t0 = Utc::now();
        let mut smoother = ModalitySmoother::new(SmoothingConfig::default());
        let calm_lead = Breakdown::from_scores([(VoiceTone::Calm, 52.0), (VoiceTone::Stressed, 48.0)]);
        let stressed_lead =
            Breakdown::from_scores([(VoiceTone::Calm, 48.0), (VoiceTone::Stressed, 52.0)]);
        smoother.update(&calm_lead, t0);
        for i in 1..20 {
            let reading = smoother.update(&stressed_lead, t0 + Duration::seconds(10 * i));
            assert_eq!(reading.label, VoiceTone::Calm);
        }
    }

    #[test]
    fn test_consecutive_ticks_respect_gate() {
        let t0 = Utc::now();
        let config = SmoothingConfig::default();
        let mut smoother = ModalitySmoother::new(config.clone());
        let frames = [
            VoiceTone::Calm,
            VoiceTone::Excited,
            VoiceTone::Calm,
            VoiceTone::Tired,
            VoiceTone::Excited,
            VoiceTone::Excited,
            VoiceTone::Tired,
        ];
        let mut last: Option<(VoiceTone, DateTime<Utc>)> = None;
        let mut last_switch = t0;
        for (i, tone) in frames.iter().enumerate() {
            let at = t0 + Duration::milliseconds(1_500 * i as i64);
            let reading = smoother.update(&only(*tone), at);
            if let Some((prev, _)) = last {
                if reading.label != prev {
                    assert!(at - last_switch >= config.min_dwell());
                    last_switch = at;
                }
            }
            last = Some((reading.label, at));
        }
    }

    #[test]
    fn test_without_hysteresis_follows_ema_winner() {
        let t0 = Utc::now();
        let config = SmoothingConfig {
            hysteresis: false,
            ..SmoothingConfig::default()
        };
        let mut smoother = ModalitySmoother::new(config);
        smoother.update(&only(VoiceTone::Calm), t0);
        smoother.update(&only(VoiceTone::Stressed), t0 + Duration::milliseconds(10));
        let r = smoother.update(&only(VoiceTone::Stressed), t0 + Duration::milliseconds(20));
        assert_eq!(r.label, VoiceTone::Stressed);
    }

    #[test]
    fn test_confidence_floor() {
        let mut smoother = ModalitySmoother::new(SmoothingConfig::default());
        let flat = Breakdown::from_scores(VoiceTone::ALL.iter().map(|t| (*t, 1.0)));
        let reading = smoother.update(&flat, Utc::now());
        assert_eq!(reading.confidence, 30.0);
    }

    #[test]
    fn test_reset() {
        let mut smoother = ModalitySmoother::new(SmoothingConfig::default());
        smoother.update(&only(VoiceTone::Calm), Utc::now());
        smoother.reset();
        assert!(smoother.current().is_none());
        assert!(smoother.smoothed().is_none());
    }
}
