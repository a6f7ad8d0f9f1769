//! Projection runner utilities (read model builders).
//!
//! Read models are **disposable**; events are the source of truth.
//! This module provides deterministic replay and cursor tracking without
//! making storage assumptions.

use thiserror::Error;

use crate::{Event, Projection};

/// Tracks projection progress through a single stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProjectionCursor {
    last_sequence_number: u64,
    applied: u64,
}

impl ProjectionCursor {
    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence_number
    }

    /// Number of events applied since the runner was created.
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Runs events through a projection and tracks progress.
#[derive(Debug)]
pub struct ProjectionRunner<P>
where
    P: Projection,
{
    projection: P,
    cursor: Option<ProjectionCursor>,
}

impl<P> ProjectionRunner<P>
where
    P: Projection,
{
    pub fn new(projection: P) -> Self {
        Self {
            projection,
            cursor: None,
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// Current cursor for this projection (if any events were applied).
    pub fn cursor(&self) -> Option<ProjectionCursor> {
        self.cursor
    }

    /// Apply a single event, enforcing strictly increasing sequence numbers.
    pub fn apply(&mut self, event: &P::Ev) -> Result<(), ProjectionError> {
        let found = event.sequence_number();

        match self.cursor {
            None => {
                self.projection.apply(event);
                self.cursor = Some(ProjectionCursor {
                    last_sequence_number: found,
                    applied: 1,
                });
                Ok(())
            }
            Some(mut c) => {
                if found <= c.last_sequence_number {
                    return Err(ProjectionError::NonMonotonicSequence {
                        last: c.last_sequence_number,
                        found,
                    });
                }

                self.projection.apply(event);
                c.last_sequence_number = found;
                c.applied += 1;
                self.cursor = Some(c);
                Ok(())
            }
        }
    }

    /// Apply many events in order.
    pub fn run<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a P::Ev>,
    ) -> Result<(), ProjectionError>
    where
        P::Ev: 'a,
    {
        for ev in events {
            self.apply(ev)?;
        }
        Ok(())
    }

    /// Rebuild a projection from scratch by replaying the full stream.
    ///
    /// The factory is used to create a fresh projection instance.
    pub fn rebuild_from_scratch<'a>(
        factory: impl FnOnce() -> P,
        events: impl IntoIterator<Item = &'a P::Ev>,
    ) -> Result<(P, Option<ProjectionCursor>), ProjectionError>
    where
        P::Ev: 'a,
    {
        let mut runner = ProjectionRunner::new(factory());
        runner.run(events)?;
        Ok((runner.projection, runner.cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone)]
    struct Tick {
        seq: u64,
        amount: u32,
    }

    impl Event for Tick {
        fn event_type(&self) -> &'static str {
            "test.tick"
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            DateTime::<Utc>::default()
        }

        fn sequence_number(&self) -> u64 {
            self.seq
        }
    }

    #[derive(Debug, Default)]
    struct Total(u32);

    impl Projection for Total {
        type Ev = Tick;

        fn apply(&mut self, event: &Tick) {
            self.0 += event.amount;
        }
    }

    #[test]
    fn rejects_replayed_sequence_numbers() {
        let mut runner = ProjectionRunner::new(Total::default());
        runner.apply(&Tick { seq: 1, amount: 4 }).unwrap();
        runner.apply(&Tick { seq: 2, amount: 1 }).unwrap();

        let err = runner.apply(&Tick { seq: 2, amount: 1 }).unwrap_err();
        assert_eq!(err, ProjectionError::NonMonotonicSequence { last: 2, found: 2 });
        assert_eq!(runner.projection().0, 5);
        assert_eq!(runner.cursor().unwrap().applied(), 2);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let ticks = vec![
            Tick { seq: 1, amount: 6 },
            Tick { seq: 2, amount: 0 },
            Tick { seq: 3, amount: 2 },
        ];

        let (a, cursor_a) = ProjectionRunner::rebuild_from_scratch(Total::default, &ticks).unwrap();
        let (b, cursor_b) = ProjectionRunner::rebuild_from_scratch(Total::default, &ticks).unwrap();

        assert_eq!(a.0, 8);
        assert_eq!(a.0, b.0);
        assert_eq!(cursor_a, cursor_b);
        assert_eq!(cursor_a.unwrap().last_sequence_number(), 3);
    }
}
