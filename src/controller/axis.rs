/// Latch state of one steering axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisState {
    #[default]
    Neutral,
    Latched,
}

/// Transition observed on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Tilt appeared: push in the axis direction
    Engaged,
    /// Tilt went away: one counter-push
    Released,
}

/// Advance an axis latch by one tick. At most one edge per call.
pub fn transition(state: AxisState, condition: bool) -> (AxisState, Option<Edge>) {
    match (state, condition) {
        (AxisState::Neutral, true) => (AxisState::Latched, Some(Edge::Engaged)),
        (AxisState::Latched, false) => (AxisState::Neutral, Some(Edge::Released)),
        (state, _) => (state, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Z tilt; engaging pushes towards -Z
    ForwardBack,
    /// X tilt; engaging pushes towards +X
    RightLeft,
}

impl Axis {
    fn engage_sign(self) -> f64 {
        match self {
            Axis::ForwardBack => -1.0,
            Axis::RightLeft => 1.0,
        }
    }

    pub fn edge_label(self, edge: Edge) -> &'static str {
        match (self, edge) {
            (Axis::ForwardBack, Edge::Engaged) => "forward",
            (Axis::ForwardBack, Edge::Released) => "backward",
            (Axis::RightLeft, Edge::Engaged) => "right",
            (Axis::RightLeft, Edge::Released) => "left",
        }
    }
}

/// One axis of the steering state: latch plus the magnitude last set by an edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisChannel {
    axis: Axis,
    state: AxisState,
    current: f64,
}

impl AxisChannel {
    pub fn new(axis: Axis) -> Self {
        Self { axis, state: AxisState::Neutral, current: 0.0 }
    }

    /// Feed this tick's tilt condition. The magnitude only changes on an edge.
    pub fn update(&mut self, condition: bool, force_factor: f64) -> Option<Edge> {
        let (state, edge) = transition(self.state, condition);
        self.state = state;
        match edge {
            Some(Edge::Engaged) => self.current = force_factor * self.axis.engage_sign(),
            Some(Edge::Released) => self.current = -force_factor * self.axis.engage_sign(),
            None => {}
        }
        edge
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn state(&self) -> AxisState {
        self.state
    }

    pub fn is_latched(&self) -> bool {
        self.state == AxisState::Latched
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}
