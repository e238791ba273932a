//! Drag simulation.
//!
//! A drag is planned completely from one geometry snapshot before the first
//! pointer event is sent: the source is the card's center, the drop point is
//! the target column's horizontal center a fixed offset below its top edge.
//! No success check happens here; the stage-transition protocol decides.

use crate::config::DragSettings;
use crate::driver::{ElementSnapshot, PointerEvent};
use crate::locator::{BoundingBox, Locator, Point};
use crate::result::{NotFoundReason, ProbeError, ProbeResult};
use crate::session::Session;
use std::time::Duration;
use tracing::{debug, info};

/// One step of a scripted gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureStep {
    /// Send a pointer event
    Pointer(PointerEvent),
    /// Hold still
    Pause(Duration),
}

/// A fully planned drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPlan {
    /// Pointer-down location
    pub source: Point,
    /// Pointer-up location
    pub target: Point,
    steps: u32,
    dwell: Duration,
}

impl DragPlan {
    /// Plan a drag from a card's box into a column's box
    pub fn between(
        source: &BoundingBox,
        target: &BoundingBox,
        settings: &DragSettings,
    ) -> ProbeResult<Self> {
        if !source.is_measurable() {
            return Err(ProbeError::GeometryUnavailable {
                what: "drag source".to_string(),
            });
        }
        if !target.is_measurable() {
            return Err(ProbeError::GeometryUnavailable {
                what: "drop target".to_string(),
            });
        }
        let offset = settings.drop_offset_y.min(target.height / 2.0);
        Ok(Self {
            source: source.center(),
            target: Point::new(target.x + target.width / 2.0, target.y + offset),
            steps: settings.steps.max(1),
            dwell: settings.dwell(),
        })
    }

    /// Intermediate moves
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// Scripted gesture: hover, press, interpolated held moves, dwell, release
    #[must_use]
    pub fn gesture(&self) -> Vec<GestureStep> {
        let mut script = Vec::with_capacity(self.steps as usize + 4);
        script.push(GestureStep::Pointer(PointerEvent::Move {
            at: self.source,
            held: false,
        }));
        script.push(GestureStep::Pointer(PointerEvent::Down(self.source)));
        for i in 1..=self.steps {
            let t = f64::from(i) / f64::from(self.steps);
            script.push(GestureStep::Pointer(PointerEvent::Move {
                at: self.source.lerp(&self.target, t),
                held: true,
            }));
        }
        script.push(GestureStep::Pause(self.dwell));
        script.push(GestureStep::Pointer(PointerEvent::Up(self.target)));
        script
    }
}

fn geometry(snapshot: &ElementSnapshot, what: &str) -> ProbeResult<BoundingBox> {
    snapshot
        .bounding_box
        .ok_or_else(|| ProbeError::GeometryUnavailable {
            what: what.to_string(),
        })
}

/// Wait for one side of the drag; a side that stays hidden is not found
async fn resolve_side(
    session: &Session,
    locator: &Locator,
    what: &str,
) -> ProbeResult<ElementSnapshot> {
    match session.expect(locator).named(what).to_be_visible().await {
        Err(ProbeError::ElementNotVisible { .. }) => Err(ProbeError::ElementNotFound {
            what: what.to_string(),
            locator: locator.to_string(),
            reason: NotFoundReason::Hidden,
        }),
        other => other,
    }
}

/// Drag `source` onto `target`, then wait out the settle delay
pub async fn drag_to(session: &Session, source: &Locator, target: &Locator) -> ProbeResult<DragPlan> {
    let card = resolve_side(session, source, "drag source").await?;
    let column = resolve_side(session, target, "drop target").await?;

    let settings = session.config().drag;
    let plan = DragPlan::between(
        &geometry(&card, "drag source")?,
        &geometry(&column, "drop target")?,
        &settings,
    )?;
    info!(
        %source,
        %target,
        from_x = plan.source.x,
        from_y = plan.source.y,
        to_x = plan.target.x,
        to_y = plan.target.y,
        "dragging"
    );

    for step in plan.gesture() {
        match step {
            GestureStep::Pointer(event) => session.pointer(event).await?,
            GestureStep::Pause(pause) => tokio::time::sleep(pause).await,
        }
    }
    debug!(settle_ms = settings.settle_ms, "drop dispatched, settling");
    tokio::time::sleep(settings.settle()).await;
    Ok(plan)
}
