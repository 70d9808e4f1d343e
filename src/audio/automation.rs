//! Scheduled parameter automation (gain and frequency envelopes).
//!
//! An [`AudioParam`] is an initial value plus a time-sorted list of
//! automation events. Rendering samples it once per audio frame with
//! [`AudioParam::value_at`], so ramps are sample-accurate.

/// How the value travels from the previous event to this one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// Jump to the value at the event time
    Step,
    /// Linear ramp ending at the event time
    Linear,
    /// Exponential ramp ending at the event time
    Exponential,
}

/// A single scheduled change on an audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    /// Audio clock time (seconds)
    pub time: f64,
    pub value: f32,
    pub curve: Curve,
}

/// Automatable parameter
#[derive(Debug, Clone)]
pub struct AudioParam {
    initial: f32,
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Scheduled events in time order
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Insert keeping time order; equal times keep insertion order
    fn schedule(&mut self, event: AutomationEvent) -> &mut Self {
        let idx = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(idx, event);
        self
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.schedule(AutomationEvent {
            time,
            value,
            curve: Curve::Step,
        })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.schedule(AutomationEvent {
            time,
            value,
            curve: Curve::Linear,
        })
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.schedule(AutomationEvent {
            time,
            value,
            curve: Curve::Exponential,
        })
    }

    /// Drop everything scheduled after `time` and hold the value reached there.
    ///
    /// A ramp that was in flight is truncated to end at `time` with the
    /// held value, so a ramp scheduled afterwards starts from wherever the
    /// old one had got to.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) -> &mut Self {
        let held = self.value_at(time);
        let split = self.events.partition_point(|e| e.time <= time);
        let in_flight = self.events.get(split).map(|e| e.curve);
        self.events.truncate(split);

        let curve = match in_flight {
            Some(Curve::Linear) => Curve::Linear,
            Some(Curve::Exponential) => Curve::Exponential,
            _ => Curve::Step,
        };
        self.events.push(AutomationEvent {
            time,
            value: held,
            curve,
        });
        self
    }

    /// Value at an audio clock time
    pub fn value_at(&self, time: f64) -> f32 {
        let next = self.events.partition_point(|e| e.time <= time);

        // Where the previous segment left off
        let (start_time, start_value) = match next.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => (0.0, self.initial),
        };

        let Some(target) = self.events.get(next) else {
            return start_value;
        };

        let span = target.time - start_time;
        if span <= 0.0 {
            return target.value;
        }
        let frac = ((time - start_time) / span).clamp(0.0, 1.0);

        match target.curve {
            Curve::Step => start_value,
            Curve::Linear => start_value + (target.value - start_value) * frac as f32,
            Curve::Exponential => {
                // Geometric interpolation is undefined through zero
                if start_value == 0.0 || start_value * target.value < 0.0 {
                    start_value
                } else {
                    let ratio = (target.value / start_value) as f64;
                    (start_value as f64 * ratio.powf(frac)) as f32
                }
            }
        }
    }
}

/// One point of an envelope, relative to the envelope's origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopePoint {
    /// Seconds after the origin
    pub offset_s: f64,
    pub value: f32,
    pub curve: Curve,
}

impl EnvelopePoint {
    pub const fn set(offset_s: f64, value: f32) -> Self {
        Self {
            offset_s,
            value,
            curve: Curve::Step,
        }
    }

    pub const fn linear(offset_s: f64, value: f32) -> Self {
        Self {
            offset_s,
            value,
            curve: Curve::Linear,
        }
    }

    pub const fn exponential(offset_s: f64, value: f32) -> Self {
        Self {
            offset_s,
            value,
            curve: Curve::Exponential,
        }
    }
}

/// A list of automation points applied to a parameter at some origin time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope(pub Vec<EnvelopePoint>);

impl Envelope {
    pub fn new(points: impl Into<Vec<EnvelopePoint>>) -> Self {
        Self(points.into())
    }

    /// Value of the first point (the level a voice begins at)
    pub fn initial_value(&self) -> f32 {
        self.0.first().map_or(0.0, |p| p.value)
    }

    /// Offset of the last point
    pub fn length_s(&self) -> f64 {
        self.0.last().map_or(0.0, |p| p.offset_s)
    }

    /// Schedule every point on `param`, shifted to start at `origin`
    pub fn apply(&self, param: &mut AudioParam, origin: f64) {
        for point in &self.0 {
            let time = origin + point.offset_s;
            match point.curve {
                Curve::Step => param.set_value_at_time(point.value, time),
                Curve::Linear => param.linear_ramp_to_value_at_time(point.value, time),
                Curve::Exponential => param.exponential_ramp_to_value_at_time(point.value, time),
            };
        }
    }

    /// Build a parameter that follows this envelope from `origin`
    pub fn to_param(&self, origin: f64) -> AudioParam {
        let mut param = AudioParam::new(self.initial_value());
        self.apply(&mut param, origin);
        param
    }
}
