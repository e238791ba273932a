//! In-memory recruitment board for testing without a browser.
//!
//! [`MockDriver`] renders the three application views (dashboard, positions
//! list, position kanban) from a [`MockApp`] into a small element tree with
//! computed geometry, evaluates locators against it, and turns a pointer
//! down / move / up sequence over a candidate card into a stage move.
//! Faults can be injected to exercise failure paths.

use crate::config::HarnessConfig;
use crate::driver::{BrowserDriver, ElementSnapshot, PointerEvent, SessionFactory};
use crate::locator::{BoundingBox, Locator, Point, Selector, TEST_ID_ATTRIBUTE};
use crate::page_object::path_of;
use crate::resolver::{stage_token, CANDIDATE_CARD_PREFIX, STAGE_COLUMN_PREFIX};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use regex::RegexBuilder;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Held moves a drag needs before a drop is accepted
pub const MIN_DRAG_MOVES: u32 = 5;

/// A candidate on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCandidate {
    /// Candidate id
    pub id: u64,
    /// Full name
    pub name: String,
}

/// One interview stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockStage {
    /// Stage title
    pub title: String,
    /// Candidates in board order
    pub candidates: Vec<MockCandidate>,
}

/// An open position with its interview flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPosition {
    /// Position id
    pub id: u64,
    /// Title
    pub title: String,
    /// `open`, `filled`, `closed` or `draft`
    pub status: String,
    /// Hiring manager
    pub manager: String,
    /// Stages in flow order
    pub stages: Vec<MockStage>,
}

impl MockPosition {
    /// Create a position with no stages
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            status: "open".to_string(),
            manager: "John Doe".to_string(),
            stages: Vec::new(),
        }
    }

    /// Set the status
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Set the manager
    #[must_use]
    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = manager.into();
        self
    }

    /// Append a stage
    #[must_use]
    pub fn stage<'a>(
        mut self,
        title: impl Into<String>,
        candidates: impl IntoIterator<Item = (u64, &'a str)>,
    ) -> Self {
        self.stages.push(MockStage {
            title: title.into(),
            candidates: candidates
                .into_iter()
                .map(|(id, name)| MockCandidate {
                    id,
                    name: name.to_string(),
                })
                .collect(),
        });
        self
    }

    /// Index of the stage holding a candidate
    #[must_use]
    pub fn stage_of(&self, candidate: u64) -> Option<usize> {
        self.stages
            .iter()
            .position(|s| s.candidates.iter().any(|c| c.id == candidate))
    }

    /// Candidate count per stage title
    #[must_use]
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.stages
            .iter()
            .map(|s| (s.title.clone(), s.candidates.len()))
            .collect()
    }
}

/// Backend state behind the board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockApp {
    /// Every position
    pub positions: Vec<MockPosition>,
}

impl MockApp {
    /// Empty application
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a position
    #[must_use]
    pub fn position(mut self, position: MockPosition) -> Self {
        self.positions.push(position);
        self
    }

    /// The seed the harness expects: position 1 with candidate 42 alone in
    /// `Initial Screening` and an empty `Technical Interview`
    #[must_use]
    pub fn seeded() -> Self {
        Self::new()
            .position(
                MockPosition::new(1, "Senior Full-Stack Engineer")
                    .stage("Initial Screening", [(42, "Ada Lovelace")])
                    .stage("Technical Interview", [])
                    .stage("Manager Interview", [(7, "Grace Hopper"), (8, "Alan Turing")])
                    .stage("Offer", []),
            )
            .position(
                MockPosition::new(2, "Data Scientist")
                    .with_status("draft")
                    .with_manager("Jane Smith")
                    .stage("Initial Screening", [(11, "Katherine Johnson")])
                    .stage("Offer", []),
            )
            .position(
                MockPosition::new(3, "Product Designer")
                    .with_status("filled")
                    .stage("Portfolio Review", []),
            )
    }

    /// Look up a position
    #[must_use]
    pub fn find(&self, id: u64) -> Option<&MockPosition> {
        self.positions.iter().find(|p| p.id == id)
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut MockPosition> {
        self.positions.iter_mut().find(|p| p.id == id)
    }

    /// Move a candidate; `keep_source` leaves a copy behind
    fn move_candidate(&mut self, position: u64, candidate: u64, stage: usize, keep_source: bool) -> bool {
        let Some(pos) = self.find_mut(position) else {
            return false;
        };
        let Some(from) = pos.stage_of(candidate) else {
            return false;
        };
        if from == stage || stage >= pos.stages.len() {
            return false;
        }
        let Some(at) = pos.stages[from].candidates.iter().position(|c| c.id == candidate) else {
            return false;
        };
        let moved = if keep_source {
            pos.stages[from].candidates[at].clone()
        } else {
            pos.stages[from].candidates.remove(at)
        };
        pos.stages[stage].candidates.push(moved);
        true
    }
}

/// Misbehavior injected into the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFault {
    /// Drops are accepted by the pointer but never persisted
    IgnoreDrops,
    /// A drop copies the card instead of moving it
    DuplicateOnDrop,
    /// A drop becomes visible only after this many queries
    DelayedDrop {
        /// Queries before the move shows up
        polls: u32,
    },
    /// Each view renders empty for this many queries after navigating
    LateRender {
        /// Queries before the view shows up
        polls: u32,
    },
    /// Element with this marker renders hidden
    Hide(String),
    /// Element with this marker renders disabled
    Disable(String),
    /// Element with this marker reports no layout box
    NoGeometry(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    None,
    Navigate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Stage(usize),
    Card(u64),
}

#[derive(Debug, Clone)]
struct Node {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    classes: Vec<&'static str>,
    text: String,
    parent: Option<usize>,
    bbox: BoundingBox,
    hidden: bool,
    enabled: bool,
    detached_geometry: bool,
    value: Option<String>,
    options: Vec<String>,
    control: Option<&'static str>,
    action: Action,
    kind: Kind,
}

impl Node {
    fn new(tag: &'static str, bbox: BoundingBox) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            classes: Vec::new(),
            text: String::new(),
            parent: None,
            bbox,
            hidden: false,
            enabled: true,
            detached_geometry: false,
            value: None,
            options: Vec::new(),
            control: None,
            action: Action::None,
            kind: Kind::Plain,
        }
    }

    fn test_id(mut self, id: impl Into<String>) -> Self {
        self.attrs.push((TEST_ID_ATTRIBUTE, id.into()));
        self
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn navigates(mut self, path: impl Into<String>) -> Self {
        self.action = Action::Navigate(path.into());
        self
    }

    fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Rendered element tree; index order is document order
#[derive(Debug, Default)]
struct Dom {
    nodes: Vec<Node>,
    cursor_y: f64,
}

impl Dom {
    fn with_root() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            cursor_y: 20.0,
        };
        dom.nodes
            .push(Node::new("body", BoundingBox::new(0.0, 0.0, 1920.0, 1080.0)));
        dom
    }

    fn add(&mut self, parent: usize, mut node: Node) -> usize {
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Next slot in the flow layout above the board
    fn row(&mut self) -> BoundingBox {
        let bbox = BoundingBox::new(20.0, self.cursor_y, 400.0, 32.0);
        self.cursor_y += 40.0;
        bbox
    }

    fn is_descendant(&self, node: usize, ancestor: usize) -> bool {
        let mut current = self.nodes[node].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p].parent;
        }
        false
    }

    fn text_content(&self, node: usize) -> String {
        (node..self.nodes.len())
            .filter(|&i| i == node || self.is_descendant(i, node))
            .map(|i| self.nodes[i].text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn rendered_visible(&self, node: usize) -> bool {
        let mut current = Some(node);
        while let Some(i) = current {
            if self.nodes[i].hidden {
                return false;
            }
            current = self.nodes[i].parent;
        }
        self.nodes[node].bbox.is_measurable()
    }

    fn matches(&self, node: usize, selector: &Selector) -> bool {
        let el = &self.nodes[node];
        match selector {
            Selector::Css(css) => css_matches(el, css),
            Selector::CssWithText { css, text } => {
                css_matches(el, css) && self.text_content(node).contains(text.as_str())
            }
            Selector::TestId(id) => el.get_attr(TEST_ID_ATTRIBUTE) == Some(id.as_str()),
            Selector::TestIdPrefix(prefix) => el
                .get_attr(TEST_ID_ATTRIBUTE)
                .is_some_and(|v| v.starts_with(prefix.as_str())),
            Selector::Placeholder(text) => el.get_attr("placeholder") == Some(text.as_str()),
            Selector::Role { role, name } => {
                let label = el
                    .get_attr("aria-label")
                    .map_or_else(|| self.text_content(node), str::to_string);
                has_role(el, role)
                    && RegexBuilder::new(name)
                        .case_insensitive(true)
                        .build()
                        .is_ok_and(|re| re.is_match(label.trim()))
            }
        }
    }

    fn evaluate(&self, locator: &Locator) -> Vec<usize> {
        let mut scope = vec![0];
        for step in locator.steps() {
            let mut found: Vec<usize> = (0..self.nodes.len())
                .filter(|&i| scope.iter().any(|&root| self.is_descendant(i, root)))
                .filter(|&i| self.matches(i, &step.selector))
                .collect();
            if let Some(k) = step.pick {
                found = found.into_iter().nth(k).into_iter().collect();
            }
            scope = found;
        }
        scope
    }

    fn snapshot(&self, node: usize) -> ElementSnapshot {
        let el = &self.nodes[node];
        let visible = self.rendered_visible(node);
        ElementSnapshot {
            visible,
            enabled: el.enabled,
            text: self.text_content(node),
            value: el.value.clone(),
            test_id: el.get_attr(TEST_ID_ATTRIBUTE).map(str::to_string),
            bounding_box: (visible && !el.detached_geometry).then_some(el.bbox),
        }
    }

    /// Topmost visible node with the given role kind under a point
    fn hit<F>(&self, at: &Point, pick: F) -> Option<Kind>
    where
        F: Fn(Kind) -> bool,
    {
        (0..self.nodes.len())
            .rev()
            .filter(|&i| pick(self.nodes[i].kind))
            .find(|&i| self.rendered_visible(i) && self.nodes[i].bbox.contains(at))
            .map(|i| self.nodes[i].kind)
    }
}

fn has_role(el: &Node, role: &str) -> bool {
    let explicit = el.get_attr("role");
    match role {
        "button" => {
            el.tag == "button"
                || explicit == Some("button")
                || (el.tag == "input"
                    && matches!(el.get_attr("type"), Some("button" | "submit")))
        }
        "link" => (el.tag == "a" && el.get_attr("href").is_some()) || explicit == Some("link"),
        other => explicit == Some(other),
    }
}

/// Selector lists of simple compounds: `tag`, `.class`, `[attr]`,
/// `[attr="v"]`, `[attr^="v"]`. Combinators never match.
fn css_matches(el: &Node, css: &str) -> bool {
    css.split(',').any(|compound| compound_matches(el, compound.trim()))
}

fn compound_matches(el: &Node, compound: &str) -> bool {
    if compound.is_empty() {
        return false;
    }
    let tag_len = compound
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '*'))
        .unwrap_or(compound.len());
    let (tag, mut rest) = compound.split_at(tag_len);
    if !(tag.is_empty() || tag == "*" || tag == el.tag) {
        return false;
    }
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                .unwrap_or(after.len());
            if !el.classes.contains(&&after[..end]) {
                return false;
            }
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let Some(close) = after.find(']') else {
                return false;
            };
            if !attribute_matches(el, &after[..close]) {
                return false;
            }
            rest = &after[close + 1..];
        } else {
            return false;
        }
    }
    true
}

fn attribute_matches(el: &Node, expr: &str) -> bool {
    let unquote = |v: &str| v.trim().trim_matches('"').trim_matches('\'').to_string();
    if let Some((name, value)) = expr.split_once("^=") {
        el.get_attr(name.trim())
            .is_some_and(|v| v.starts_with(&unquote(value)))
    } else if let Some((name, value)) = expr.split_once('=') {
        el.get_attr(name.trim()) == Some(unquote(value).as_str())
    } else {
        el.get_attr(expr.trim()).is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    candidate: Option<u64>,
    moves: u32,
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    position: u64,
    candidate: u64,
    stage: usize,
    remaining: u32,
}

#[derive(Debug)]
struct MockState {
    app: MockApp,
    url: String,
    faults: Vec<MockFault>,
    inputs: HashMap<&'static str, String>,
    drag: Option<DragState>,
    pending: Option<PendingMove>,
    render_delay: u32,
    history: Vec<String>,
    pointer_log: Vec<PointerEvent>,
    closed: bool,
}

impl MockState {
    fn position_in_view(&self) -> Option<u64> {
        path_of(&self.url)
            .strip_prefix("/positions/")
            .and_then(|id| id.parse().ok())
    }

    fn origin(&self) -> &str {
        self.url.split_once("://").map_or("", |(scheme, rest)| {
            let host_len = rest.find('/').unwrap_or(rest.len());
            &self.url[..scheme.len() + 3 + host_len]
        })
    }

    fn arrive(&mut self, url: String) {
        self.url = url;
        self.drag = None;
        self.render_delay = self
            .faults
            .iter()
            .find_map(|f| match f {
                MockFault::LateRender { polls } => Some(*polls),
                _ => None,
            })
            .unwrap_or(0);
    }

    /// Advance per-query timers
    fn tick(&mut self) {
        self.render_delay = self.render_delay.saturating_sub(1);
        if let Some(mut pending) = self.pending.take() {
            if pending.remaining <= 1 {
                let _ = self
                    .app
                    .move_candidate(pending.position, pending.candidate, pending.stage, false);
            } else {
                pending.remaining -= 1;
                self.pending = Some(pending);
            }
        }
    }

    fn render(&self) -> Dom {
        let mut dom = Dom::with_root();
        if self.render_delay > 0 || self.url.starts_with("about:") {
            return dom;
        }
        let path = path_of(&self.url);
        if path == "/" {
            self.render_dashboard(&mut dom);
        } else if path == "/positions" {
            self.render_positions(&mut dom);
        } else if let Some(id) = self.position_in_view() {
            self.render_details(&mut dom, id);
        } else {
            let row = dom.row();
            let _ = dom.add(0, Node::new("h1", row).text("404"));
        }
        self.apply_faults(&mut dom);
        dom
    }

    fn render_dashboard(&self, dom: &mut Dom) {
        let row = dom.row();
        let _ = dom.add(0, Node::new("h1", row).text("Dashboard del Reclutador"));
        let row = dom.row();
        let _ = dom.add(
            0,
            Node::new("button", row)
                .text("Añadir Nuevo Candidato")
                .navigates("/add-candidate"),
        );
        let row = dom.row();
        let _ = dom.add(
            0,
            Node::new("button", row)
                .text("Ir a Posiciones")
                .navigates("/positions"),
        );
    }

    fn render_positions(&self, dom: &mut Dom) {
        let page = dom.add(
            0,
            Node::new("div", BoundingBox::new(0.0, 0.0, 1920.0, 1080.0)).test_id("positions-page"),
        );
        let row = dom.row();
        let _ = dom.add(
            page,
            Node::new("button", row)
                .test_id("back-to-dashboard-btn")
                .text("Volver al Dashboard")
                .navigates("/"),
        );
        let row = dom.row();
        let _ = dom.add(
            page,
            Node::new("h2", row).test_id("positions-title").text("Posiciones"),
        );

        let row = dom.row();
        let mut search = Node::new("input", row)
            .attr("type", "text")
            .attr("placeholder", "Buscar por título");
        search.control = Some("title-search");
        search.value = Some(self.inputs.get("title-search").cloned().unwrap_or_default());
        let _ = dom.add(page, search);

        let row = dom.row();
        let mut date = Node::new("input", row).attr("type", "date");
        date.control = Some("date");
        date.value = Some(self.inputs.get("date").cloned().unwrap_or_default());
        let _ = dom.add(page, date);

        let row = dom.row();
        let mut status = Node::new("select", row).text("Estado");
        status.control = Some("status");
        status.options = ["", "open", "filled", "closed", "draft"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        status.value = Some(self.inputs.get("status").cloned().unwrap_or_default());
        let _ = dom.add(page, status);

        let row = dom.row();
        let mut manager = Node::new("select", row).text("Manager");
        manager.control = Some("manager");
        manager.options = std::iter::once(String::new())
            .chain(self.app.positions.iter().map(|p| p.manager.clone()))
            .collect();
        manager.value = Some(self.inputs.get("manager").cloned().unwrap_or_default());
        let _ = dom.add(page, manager);

        let list_top = dom.cursor_y;
        let list = dom.add(
            page,
            Node::new("div", BoundingBox::new(0.0, list_top, 1920.0, 800.0))
                .test_id("positions-list"),
        );
        for (i, position) in self.app.positions.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = 20.0 + i as f64 * 320.0;
            let top = dom.cursor_y;
            let card = dom.add(
                list,
                Node::new("div", BoundingBox::new(x, top, 300.0, 200.0))
                    .test_id(format!("position-card-{}", position.id))
                    .class("card"),
            );
            let _ = dom.add(
                card,
                Node::new("h5", BoundingBox::new(x + 10.0, top + 10.0, 280.0, 30.0))
                    .class("card-title")
                    .text(position.title.clone()),
            );
            let _ = dom.add(
                card,
                Node::new("span", BoundingBox::new(x + 10.0, top + 50.0, 280.0, 24.0))
                    .class("badge")
                    .text(position.status.clone()),
            );
            let _ = dom.add(
                card,
                Node::new("p", BoundingBox::new(x + 10.0, top + 80.0, 280.0, 24.0))
                    .text(format!("Manager: {}", position.manager)),
            );
            let _ = dom.add(
                card,
                Node::new("button", BoundingBox::new(x + 10.0, top + 150.0, 120.0, 36.0))
                    .text("Ver proceso")
                    .navigates(format!("/positions/{}", position.id)),
            );
        }
    }

    fn render_details(&self, dom: &mut Dom, id: u64) {
        let Some(position) = self.app.find(id) else {
            let row = dom.row();
            let _ = dom.add(0, Node::new("p", row).text("Posición no encontrada"));
            return;
        };
        let page = dom.add(
            0,
            Node::new("div", BoundingBox::new(0.0, 0.0, 1920.0, 1080.0))
                .test_id("position-details-page"),
        );
        let row = dom.row();
        let _ = dom.add(
            page,
            Node::new("button", row)
                .test_id("back-to-positions-btn")
                .text("Volver a Posiciones")
                .navigates("/positions"),
        );
        let row = dom.row();
        let _ = dom.add(
            page,
            Node::new("h2", row)
                .test_id("position-name")
                .text(position.title.clone()),
        );
        let board = dom.add(
            page,
            Node::new("div", BoundingBox::new(0.0, 180.0, 1920.0, 640.0)).test_id("kanban-board"),
        );
        for (i, stage) in position.stages.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = 20.0 + i as f64 * 320.0;
            let token = stage_token(&stage.title);
            let mut column = Node::new("div", BoundingBox::new(x, 200.0, 300.0, 600.0))
                .test_id(format!("{STAGE_COLUMN_PREFIX}{token}"));
            column.kind = Kind::Stage(i);
            let column = dom.add(board, column);
            let _ = dom.add(
                column,
                Node::new("div", BoundingBox::new(x, 200.0, 300.0, 40.0))
                    .test_id(format!("stage-header-{token}"))
                    .text(stage.title.clone()),
            );
            for (j, candidate) in stage.candidates.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let y = 260.0 + j as f64 * 90.0;
                let mut card = Node::new("div", BoundingBox::new(x + 10.0, y, 280.0, 80.0))
                    .test_id(format!("{CANDIDATE_CARD_PREFIX}{}", candidate.id))
                    .class("card");
                card.kind = Kind::Card(candidate.id);
                let card = dom.add(column, card);
                let _ = dom.add(
                    card,
                    Node::new("span", BoundingBox::new(x + 20.0, y + 10.0, 260.0, 24.0))
                        .test_id(format!("candidate-name-{}", candidate.id))
                        .text(candidate.name.clone()),
                );
            }
        }
    }

    fn apply_faults(&self, dom: &mut Dom) {
        for fault in &self.faults {
            let (MockFault::Hide(marker) | MockFault::Disable(marker) | MockFault::NoGeometry(marker)) =
                fault
            else {
                continue;
            };
            for node in &mut dom.nodes {
                if node.get_attr(TEST_ID_ATTRIBUTE) != Some(marker.as_str()) {
                    continue;
                }
                match fault {
                    MockFault::Hide(_) => node.hidden = true,
                    MockFault::Disable(_) => node.enabled = false,
                    _ => node.detached_geometry = true,
                }
            }
        }
    }

    fn has_fault(&self, probe: impl Fn(&MockFault) -> bool) -> bool {
        self.faults.iter().any(probe)
    }

    fn first_match(&self, locator: &Locator, op: &str) -> ProbeResult<(Dom, usize)> {
        let dom = self.render();
        let node = dom.evaluate(locator).first().copied().ok_or_else(|| {
            ProbeError::driver(format!("{op}: nothing matches {locator}"))
        })?;
        if !dom.rendered_visible(node) {
            return Err(ProbeError::driver(format!("{op}: {locator} is not visible")));
        }
        if !dom.nodes[node].enabled {
            return Err(ProbeError::driver(format!("{op}: {locator} is disabled")));
        }
        Ok((dom, node))
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.pointer_log.push(event);
        match event {
            PointerEvent::Down(at) => {
                let candidate = self
                    .render()
                    .hit(&at, |r| matches!(r, Kind::Card(_)))
                    .and_then(|r| match r {
                        Kind::Card(id) => Some(id),
                        _ => None,
                    });
                self.drag = Some(DragState { candidate, moves: 0 });
            }
            PointerEvent::Move { held, .. } => {
                if let Some(drag) = self.drag.as_mut() {
                    if held {
                        drag.moves += 1;
                    }
                }
            }
            PointerEvent::Up(at) => {
                let Some(DragState {
                    candidate: Some(candidate),
                    moves,
                }) = self.drag.take()
                else {
                    return;
                };
                if moves < MIN_DRAG_MOVES {
                    return;
                }
                let stage = self
                    .render()
                    .hit(&at, |r| matches!(r, Kind::Stage(_)))
                    .and_then(|r| match r {
                        Kind::Stage(i) => Some(i),
                        _ => None,
                    });
                if let (Some(stage), Some(position)) = (stage, self.position_in_view()) {
                    self.drop_on(position, candidate, stage);
                }
            }
        }
    }

    fn drop_on(&mut self, position: u64, candidate: u64, stage: usize) {
        if self.has_fault(|f| matches!(f, MockFault::IgnoreDrops)) {
            return;
        }
        let delay = self.faults.iter().find_map(|f| match f {
            MockFault::DelayedDrop { polls } => Some(*polls),
            _ => None,
        });
        if let Some(polls) = delay {
            self.pending = Some(PendingMove {
                position,
                candidate,
                stage,
                remaining: polls,
            });
            return;
        }
        let duplicate = self.has_fault(|f| matches!(f, MockFault::DuplicateOnDrop));
        let _ = self.app.move_candidate(position, candidate, stage, duplicate);
    }
}

/// Mock driver over an in-memory board
#[derive(Debug, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Create a driver showing `about:blank`
    #[must_use]
    pub fn new(app: MockApp) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                app,
                url: "about:blank".to_string(),
                faults: Vec::new(),
                inputs: HashMap::new(),
                drag: None,
                pending: None,
                render_delay: 0,
                history: Vec::new(),
                pointer_log: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Install faults
    #[must_use]
    pub fn with_faults(self, faults: Vec<MockFault>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.faults = faults;
        }
        self
    }

    /// Add a fault mid-session
    pub fn inject(&self, fault: MockFault) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.push(fault);
        }
    }

    fn lock(&self) -> ProbeResult<MutexGuard<'_, MockState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| ProbeError::driver("mock state poisoned"))?;
        if state.closed {
            return Err(ProbeError::driver("session closed"));
        }
        Ok(state)
    }

    /// Current backend state
    #[must_use]
    pub fn app(&self) -> MockApp {
        self.state
            .lock()
            .map(|s| s.app.clone())
            .unwrap_or_default()
    }

    /// Recorded calls, oldest first
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.call_history().iter().any(|c| c.starts_with(prefix))
    }

    /// Pointer events received, oldest first
    #[must_use]
    pub fn pointer_events(&self) -> Vec<PointerEvent> {
        self.state
            .lock()
            .map(|s| s.pointer_log.clone())
            .unwrap_or_default()
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    fn navigate_sync(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.history.push(format!("navigate:{url}"));
        state.arrive(url.to_string());
        Ok(())
    }

    fn query_sync(&self, locator: &Locator) -> ProbeResult<Vec<ElementSnapshot>> {
        let mut state = self.lock()?;
        state.tick();
        state.history.push(format!("query:{locator}"));
        let dom = state.render();
        Ok(dom
            .evaluate(locator)
            .into_iter()
            .map(|i| dom.snapshot(i))
            .collect())
    }

    fn click_sync(&self, locator: &Locator) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.history.push(format!("click:{locator}"));
        let (dom, node) = state.first_match(locator, "click")?;
        if let Action::Navigate(path) = &dom.nodes[node].action {
            let url = format!("{}{path}", state.origin());
            state.arrive(url);
        }
        Ok(())
    }

    fn fill_sync(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.history.push(format!("fill:{locator}={text}"));
        let (dom, node) = state.first_match(locator, "fill")?;
        let el = &dom.nodes[node];
        match (el.tag, el.control) {
            ("input", Some(control)) => {
                let _ = state.inputs.insert(control, text.to_string());
                Ok(())
            }
            _ => Err(ProbeError::driver(format!("fill: {locator} is not an input"))),
        }
    }

    fn select_sync(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.history.push(format!("select:{locator}={value}"));
        let (dom, node) = state.first_match(locator, "select")?;
        let el = &dom.nodes[node];
        match (el.tag, el.control) {
            ("select", Some(control)) if el.options.iter().any(|o| o == value) => {
                let _ = state.inputs.insert(control, value.to_string());
                Ok(())
            }
            ("select", _) => Err(ProbeError::driver(format!(
                "select: {locator} has no option {value:?}"
            ))),
            _ => Err(ProbeError::driver(format!("select: {locator} is not a select"))),
        }
    }

    fn pointer_sync(&self, event: PointerEvent) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.history.push(format!("pointer:{event}"));
        state.pointer(event);
        Ok(())
    }

    fn close_sync(&self) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.history.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.navigate_sync(url)
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock()?.url.clone())
    }

    async fn query(&self, locator: &Locator) -> ProbeResult<Vec<ElementSnapshot>> {
        self.query_sync(locator)
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.click_sync(locator)
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.fill_sync(locator, text)
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        self.select_sync(locator, value)
    }

    async fn dispatch_pointer(&self, event: PointerEvent) -> ProbeResult<()> {
        self.pointer_sync(event)
    }

    async fn close(&self) -> ProbeResult<()> {
        self.close_sync()
    }
}

/// Opens a fresh board per session from one seed
#[derive(Debug, Default)]
pub struct MockSessions {
    seed: MockApp,
    faults: Vec<MockFault>,
    opened: Mutex<Vec<MockDriver>>,
}

impl MockSessions {
    /// Sessions over copies of `seed`
    #[must_use]
    pub fn new(seed: MockApp) -> Self {
        Self {
            seed,
            faults: Vec::new(),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Faults installed in every session
    #[must_use]
    pub fn with_faults(mut self, faults: Vec<MockFault>) -> Self {
        self.faults = faults;
        self
    }

    /// Drivers handed out so far
    #[must_use]
    pub fn opened(&self) -> Vec<MockDriver> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SessionFactory for MockSessions {
    fn label(&self) -> &str {
        "mock"
    }

    async fn open(&self, _config: Arc<HarnessConfig>) -> ProbeResult<Box<dyn BrowserDriver>> {
        let driver = MockDriver::new(self.seed.clone()).with_faults(self.faults.clone());
        self.opened
            .lock()
            .map_err(|_| ProbeError::driver("session registry poisoned"))?
            .push(driver.clone());
        Ok(Box::new(driver))
    }
}
