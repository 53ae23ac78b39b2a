//! # Edit Session
//!
//! [`EditorSession`] is the single active editing context: which document
//! is open, its live tree, the current selection and that document's undo
//! history. It owns the document store and talks to the site through a
//! [`SourceProvider`].
//!
//! ## Loading
//!
//! ```text
//! load(path) ──▶ edit buffer ──▶ original cache ──▶ fetch (cached verbatim)
//!                   │                  │                  │
//!                   │                  └── inject <base> ─┤
//!                   └─────────────────────────────────────┴──▶ live tree
//! ```
//!
//! Every load takes a fresh generation number. A load that finishes after a
//! newer load (or revert) has started is discarded, see
//! [`EditorSession::begin_load`] and [`EditorSession::complete_load`].
//!
//! Replacing the live tree (load, undo, redo, revert) clears the selection,
//! and loading or reverting also clears the undo history. A failed load
//! leaves the session exactly as it was.
//!
//! ## Mutations
//!
//! Every edit goes through [`EditorSession::mutate`]: validate, record a
//! snapshot for undo, apply, then update the selection.

use crate::affordances::{self, Affordances};
use crate::assets::AssetCollector;
use crate::config::EditorConfig;
use crate::document::{DocumentStore, StoredContent};
use crate::errors::{EditorError, HistoryDirection};
use crate::export::{ArchiveSink, ExportBundle, ExportedDocument};
use crate::inspector::{project_fields, visible_classes, FieldValues, InspectorField};
use crate::mutations::{Fragment, Mutation, MutationError, Plan};
use crate::path::SitePath;
use crate::sanitize::{Sanitized, Sanitizer};
use crate::snapshot::Snapshot;
use crate::source::{FetchError, SourceProvider};
use crate::undo_stack::UndoStack;
use pagecraft_html::{inner_html, normalize_document, serialize_document, DomTree, NodeId, NodePath};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Handle for a load in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    path: SitePath,
}

impl LoadTicket {
    pub fn path(&self) -> &SitePath {
        &self.path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The document is now the active one
    Applied,
    /// A newer load started first; the result was dropped
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// Nothing to change; no undo step was recorded
    Unchanged,
}

/// Width of the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    #[default]
    Full,
    Pixels(u32),
}

impl FromStr for Viewport {
    type Err = EditorError;

    /// `full`, or a positive width with an optional `px` suffix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.eq_ignore_ascii_case("full") {
            return Ok(Viewport::Full);
        }
        let digits = raw.strip_suffix("px").unwrap_or(raw).trim();
        match digits.parse::<u32>() {
            Ok(width) if width > 0 => Ok(Viewport::Pixels(width)),
            _ => Err(EditorError::InvalidViewport(s.to_string())),
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewport::Full => write!(f, "full"),
            Viewport::Pixels(width) => write!(f, "{width}px"),
        }
    }
}

/// One step of the selection's ancestor chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// `tag#id.class1.class2`
    pub label: String,
    pub path: NodePath,
}

struct ActiveDocument {
    path: SitePath,
    tree: DomTree,
    selection: Option<NodeId>,
    history: UndoStack,
}

pub struct EditorSession {
    config: EditorConfig,
    provider: Arc<dyn SourceProvider>,
    store: DocumentStore,
    sanitizer: Sanitizer,
    pages: BTreeSet<SitePath>,
    components: BTreeSet<SitePath>,
    active: Option<ActiveDocument>,
    affordances: Affordances,
    viewport: Viewport,
    generation: u64,
}

impl EditorSession {
    pub fn new(provider: Arc<dyn SourceProvider>, config: EditorConfig) -> Self {
        Self::with_store(provider, config, DocumentStore::new())
    }

    /// Start from an existing document store
    pub fn with_store(
        provider: Arc<dyn SourceProvider>,
        config: EditorConfig,
        store: DocumentStore,
    ) -> Self {
        let pages = known_paths(&config.initial_pages);
        let components = known_paths(&config.initial_components);
        Self {
            sanitizer: Sanitizer::new(config.source_prefix.clone()),
            config,
            provider,
            store,
            pages,
            components,
            active: None,
            affordances: Affordances::default(),
            viewport: Viewport::default(),
            generation: 0,
        }
    }

    // ---- State --------------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn current_path(&self) -> Option<&SitePath> {
        self.active.as_ref().map(|doc| &doc.path)
    }

    pub fn tree(&self) -> Option<&DomTree> {
        self.active.as_ref().map(|doc| &doc.tree)
    }

    /// Snapshot of the live tree
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.tree().map(Snapshot::capture)
    }

    pub fn selection(&self) -> Option<NodePath> {
        let doc = self.active.as_ref()?;
        doc.tree.path_of(doc.selection?)
    }

    pub fn history(&self) -> Option<&UndoStack> {
        self.active.as_ref().map(|doc| &doc.history)
    }

    pub fn can_undo(&self) -> bool {
        self.history().is_some_and(UndoStack::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history().is_some_and(UndoStack::can_redo)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn affordances(&self) -> Affordances {
        self.affordances
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn active(&self) -> Result<&ActiveDocument, EditorError> {
        self.active.as_ref().ok_or(EditorError::NoDocument)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveDocument, EditorError> {
        self.active.as_mut().ok_or(EditorError::NoDocument)
    }

    // ---- Known paths --------------------------------------------------------

    pub fn add_page_path(&mut self, raw: &str) -> Result<SitePath, EditorError> {
        let path = SitePath::new(raw)?;
        self.pages.insert(path.clone());
        Ok(path)
    }

    pub fn add_component_path(&mut self, raw: &str) -> Result<SitePath, EditorError> {
        let path = SitePath::new(raw)?;
        self.components.insert(path.clone());
        Ok(path)
    }

    /// Known pages plus every cached or buffered document, sorted
    pub fn pages(&self) -> Vec<SitePath> {
        let mut pages = self.pages.clone();
        pages.extend(self.store.known_paths());
        pages.into_iter().collect()
    }

    pub fn components(&self) -> Vec<SitePath> {
        self.components.iter().cloned().collect()
    }

    /// Put a blank page into the edit buffer. The active document is not
    /// changed.
    pub fn create_page(&mut self, raw: &str) -> Result<SitePath, EditorError> {
        let path = SitePath::new(raw)?;
        let tree = page_skeleton(path.as_str());
        self.store.save_edit(&path, Snapshot::capture(&tree));
        self.pages.insert(path.clone());
        tracing::info!(path = %path, "Created page in buffer");
        Ok(path)
    }

    // ---- Loading ------------------------------------------------------------

    /// Load `path` and make it the active document.
    pub async fn load(&mut self, path: &SitePath) -> Result<LoadOutcome, EditorError> {
        let ticket = self.begin_load(path.clone());
        let fetched = if self.needs_fetch(path) {
            Some(self.provider.fetch_text(path).await)
        } else {
            None
        };
        self.complete_load(ticket, fetched)
    }

    /// Start a load. Any load begun earlier becomes stale.
    pub fn begin_load(&mut self, path: SitePath) -> LoadTicket {
        self.generation += 1;
        tracing::debug!(path = %path, generation = self.generation, "Begin load");
        LoadTicket {
            generation: self.generation,
            path,
        }
    }

    /// Whether neither the buffer nor the cache can supply `path`
    pub fn needs_fetch(&self, path: &SitePath) -> bool {
        self.store.resolve(path).is_none()
    }

    /// Finish a load begun with [`EditorSession::begin_load`].
    ///
    /// `fetched` carries the source fetch result when one was needed.
    /// Successfully fetched text is cached even when the ticket is stale.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        fetched: Option<Result<String, FetchError>>,
    ) -> Result<LoadOutcome, EditorError> {
        let LoadTicket { generation, path } = ticket;
        if let Some(Ok(text)) = &fetched {
            self.store
                .cache_original(&path, Snapshot::from_source(text.as_str()));
        }
        if generation != self.generation {
            tracing::warn!(
                path = %path,
                generation,
                current = self.generation,
                "Discarding superseded load"
            );
            return Ok(LoadOutcome::Superseded);
        }
        if let Some(Err(source)) = fetched {
            return Err(EditorError::Load { path, source });
        }

        let tree = match self.store.resolve(&path) {
            Some(StoredContent::Edited(snapshot)) => snapshot.restore()?,
            Some(StoredContent::Original(snapshot)) => {
                let mut tree = snapshot.restore()?;
                self.inject_base(&path, &mut tree);
                tree
            }
            None => {
                return Err(EditorError::Load {
                    source: FetchError::NotFound(path.clone()),
                    path,
                })
            }
        };
        self.activate(path, tree);
        Ok(LoadOutcome::Applied)
    }

    /// Point relative references at the document's own directory.
    fn inject_base(&self, path: &SitePath, tree: &mut DomTree) {
        let Some(head) = tree.head() else {
            return;
        };
        let base = tree.create_element("base");
        let href = format!("{}{}", self.config.source_prefix, path.dirname());
        tree.set_attribute(base, "href", href);
        tree.insert_child(head, 0, base);
    }

    fn activate(&mut self, path: SitePath, mut tree: DomTree) {
        self.affordances.apply(&mut tree);
        tracing::info!(path = %path, "Loaded document");
        self.active = Some(ActiveDocument {
            path,
            tree,
            selection: None,
            history: UndoStack::with_max_levels(self.config.undo_limit),
        });
    }

    /// Drop the buffered edit of the active document and reload it from
    /// the original, or from the source when nothing is cached.
    pub async fn revert(&mut self) -> Result<LoadOutcome, EditorError> {
        let path = self.active()?.path.clone();
        self.store.discard_edit(&path);
        match self.store.original(&path).cloned() {
            Some(original) => {
                self.generation += 1;
                let mut tree = original.restore()?;
                self.inject_base(&path, &mut tree);
                self.activate(path, tree);
                Ok(LoadOutcome::Applied)
            }
            None => self.load(&path).await,
        }
    }

    // ---- Buffer -------------------------------------------------------------

    /// Store the live tree in the edit buffer under the active path.
    pub fn save(&mut self) -> Result<SitePath, EditorError> {
        let doc = self.active()?;
        let path = doc.path.clone();
        let snapshot = Snapshot::capture(&doc.tree);
        tracing::info!(path = %path, bytes = snapshot.len(), "Saved to buffer");
        self.store.save_edit(&path, snapshot);
        Ok(path)
    }

    // ---- Selection ----------------------------------------------------------

    /// Select the element at `target`, or clear the selection.
    pub fn select(&mut self, target: Option<&NodePath>) -> Result<(), EditorError> {
        let doc = self.active_mut()?;
        match target {
            Some(path) => {
                let node = resolve_element(&doc.tree, path)?;
                affordances::mark_selected(&mut doc.tree, node);
                doc.selection = Some(node);
            }
            None => {
                affordances::clear_markers(&mut doc.tree);
                doc.selection = None;
            }
        }
        Ok(())
    }

    /// Mark the element under the pointer. Ignored outside select mode.
    pub fn hover(&mut self, target: Option<&NodePath>) -> Result<(), EditorError> {
        if !self.affordances.select_mode {
            return Ok(());
        }
        let doc = self.active_mut()?;
        let node = target
            .map(|path| resolve_element(&doc.tree, path))
            .transpose()?;
        affordances::mark_hover(&mut doc.tree, node);
        Ok(())
    }

    /// Inspector fields of the selected element
    pub fn inspect(&self) -> Result<Vec<InspectorField>, EditorError> {
        let doc = self.active()?;
        let node = doc.selection.ok_or(MutationError::NoSelection)?;
        Ok(project_fields(&doc.tree, node))
    }

    /// Ancestors of the selection below the root, outermost first
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let Some(doc) = self.active.as_ref() else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut current = doc.selection;
        while let Some(node) = current {
            if node == doc.tree.root() {
                break;
            }
            if let Some(path) = doc.tree.path_of(node) {
                chain.push(Breadcrumb {
                    label: breadcrumb_label(&doc.tree, node),
                    path,
                });
            }
            current = doc.tree.parent(node);
        }
        chain.reverse();
        chain
    }

    // ---- Mutations ----------------------------------------------------------

    /// Validate, record and apply `mutation` on the live tree.
    pub fn mutate(&mut self, mutation: Mutation) -> Result<MutationOutcome, EditorError> {
        let modes = self.affordances;
        let doc = self.active_mut()?;
        if mutation.validate(&doc.tree, doc.selection)? == Plan::Unchanged {
            tracing::debug!(mutation = %mutation.description(), "Mutation changes nothing");
            return Ok(MutationOutcome::Unchanged);
        }

        let description = mutation.description();
        doc.history.record(Snapshot::capture(&doc.tree), description.as_str());
        let selection = mutation.apply(&mut doc.tree, doc.selection);
        normalize_document(&mut doc.tree);

        doc.selection = selection.filter(|&node| doc.tree.is_attached(node));
        if let Some(node) = doc.selection {
            affordances::mark_selected(&mut doc.tree, node);
        }
        modes.apply(&mut doc.tree);
        tracing::debug!(
            mutation = %description,
            undo_levels = doc.history.undo_levels(),
            "Applied mutation"
        );
        Ok(MutationOutcome::Applied)
    }

    pub fn apply_inspector(&mut self, values: FieldValues) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::ApplyInspector(values))
    }

    pub fn delete_selected(&mut self) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::Delete)
    }

    pub fn insert_element(&mut self, tag: &str) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::InsertElement {
            tag: tag.to_string(),
        })
    }

    pub fn wrap_selected(&mut self) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::Wrap)
    }

    pub fn move_up(&mut self) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::MoveUp)
    }

    pub fn move_down(&mut self) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::MoveDown)
    }

    pub fn duplicate(&mut self) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::Duplicate)
    }

    pub fn apply_asset_to_image(&mut self, src: &str) -> Result<MutationOutcome, EditorError> {
        self.mutate(Mutation::SetImageSource {
            src: src.to_string(),
        })
    }

    /// Current `<head>` markup, for editing
    pub fn head_markup(&self) -> Result<String, EditorError> {
        let doc = self.active()?;
        Ok(doc
            .tree
            .head()
            .map(|head| inner_html(&doc.tree, head))
            .unwrap_or_default())
    }

    /// Replace the children of `<head>` with `markup`.
    pub fn edit_head(&mut self, markup: &str) -> Result<MutationOutcome, EditorError> {
        let fragment = Fragment::parse(markup)?;
        self.mutate(Mutation::ReplaceHead(fragment))
    }

    /// Fetch a component and append it to the selection (or body).
    ///
    /// A failed fetch is reported and leaves the document and its history
    /// untouched.
    pub async fn insert_component(&mut self, raw: &str) -> Result<MutationOutcome, EditorError> {
        self.active()?;
        let path = SitePath::new(raw)?;
        let markup = self.provider.fetch_text(&path).await.map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Component fetch failed");
            EditorError::Fetch(e)
        })?;
        let fragment = Fragment::parse(&markup)?;
        self.components.insert(path);
        self.mutate(Mutation::InsertFragment(fragment))
    }

    // ---- History ------------------------------------------------------------

    pub fn undo(&mut self) -> Result<(), EditorError> {
        self.travel(HistoryDirection::Undo)
    }

    pub fn redo(&mut self) -> Result<(), EditorError> {
        self.travel(HistoryDirection::Redo)
    }

    fn travel(&mut self, direction: HistoryDirection) -> Result<(), EditorError> {
        let modes = self.affordances;
        let doc = self.active_mut()?;
        let target = match direction {
            HistoryDirection::Undo => doc.history.peek_undo(),
            HistoryDirection::Redo => doc.history.peek_redo(),
        }
        .ok_or(EditorError::EmptyHistory(direction))?;
        let mut tree = target.snapshot.restore()?;

        let current = Snapshot::capture(&doc.tree);
        let entry = match direction {
            HistoryDirection::Undo => doc.history.undo(current),
            HistoryDirection::Redo => doc.history.redo(current),
        };
        modes.apply(&mut tree);
        doc.tree = tree;
        doc.selection = None;
        tracing::debug!(
            ?direction,
            description = entry.and_then(|e| e.description).as_deref().unwrap_or_default(),
            "History step"
        );
        Ok(())
    }

    // ---- Affordances --------------------------------------------------------

    pub fn set_editable(&mut self, enabled: bool) {
        self.affordances.editable = enabled;
        let modes = self.affordances;
        if let Some(doc) = self.active.as_mut() {
            modes.apply(&mut doc.tree);
        }
    }

    /// Turning select mode off also clears every marker class.
    pub fn set_select_mode(&mut self, enabled: bool) {
        self.affordances.select_mode = enabled;
        let modes = self.affordances;
        if let Some(doc) = self.active.as_mut() {
            if !enabled {
                affordances::clear_markers(&mut doc.tree);
            }
            modes.apply(&mut doc.tree);
        }
    }

    pub fn set_viewport(&mut self, raw: &str) -> Result<Viewport, EditorError> {
        let viewport = raw.parse::<Viewport>()?;
        self.viewport = viewport;
        Ok(viewport)
    }

    // ---- Output -------------------------------------------------------------

    /// The live document as is, for a preview window
    pub fn preview(&self) -> Result<String, EditorError> {
        Ok(serialize_document(&self.active()?.tree))
    }

    /// File name and sanitized markup of the active document
    pub fn download_page(&self) -> Result<(String, Sanitized), EditorError> {
        let doc = self.active()?;
        let mut sanitized = self.sanitizer.sanitize(&serialize_document(&doc.tree));
        if let Some(warning) = sanitized.warning.as_mut() {
            warning.path = Some(doc.path.clone());
        }
        Ok((doc.path.file_name().to_string(), sanitized))
    }

    pub async fn download_page_to(&self, sink: &dyn ArchiveSink) -> Result<String, EditorError> {
        let (file_name, sanitized) = self.download_page()?;
        sink.write_page(&file_name, &sanitized.html).await?;
        tracing::info!(file = %file_name, "Downloaded page");
        Ok(file_name)
    }

    /// Sanitize every buffered document and, if asked, collect assets.
    pub async fn export(&self, include_assets: bool) -> Result<ExportBundle, EditorError> {
        if !self.store.has_edits() {
            return Err(EditorError::NothingToExport);
        }

        let mut bundle = ExportBundle::default();
        for (path, snapshot) in self.store.edits() {
            let Sanitized { html, warning } = self.sanitizer.sanitize(snapshot.as_str());
            if let Some(mut warning) = warning {
                warning.path = Some(path.clone());
                bundle.warnings.push(warning);
            }
            bundle.documents.push(ExportedDocument {
                path: path.clone(),
                html,
            });
        }

        if include_assets {
            let collector = AssetCollector::new(self.provider.clone(), self.config.asset_timeout());
            bundle.assets = collector
                .collect(bundle.documents.iter().map(|doc| doc.html.as_str()))
                .await;
        }
        tracing::info!(
            documents = bundle.documents.len(),
            assets = bundle.assets.len(),
            warnings = bundle.warnings.len(),
            "Prepared export"
        );
        Ok(bundle)
    }

    /// [`EditorSession::export`] and hand the bundle to `sink`.
    pub async fn export_to(
        &self,
        sink: &dyn ArchiveSink,
        include_assets: bool,
    ) -> Result<ExportBundle, EditorError> {
        let bundle = self.export(include_assets).await?;
        sink.write_bundle(&bundle).await?;
        Ok(bundle)
    }
}

fn known_paths(raw: &[String]) -> BTreeSet<SitePath> {
    raw.iter()
        .filter_map(|raw| match SitePath::new(raw) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(path = %raw, error = %e, "Ignoring configured path");
                None
            }
        })
        .collect()
}

fn resolve_element(tree: &DomTree, path: &NodePath) -> Result<NodeId, EditorError> {
    tree.resolve(path)
        .filter(|&node| tree.is_any_element(node))
        .ok_or_else(|| EditorError::NodeNotFound(path.to_string()))
}

fn breadcrumb_label(tree: &DomTree, node: NodeId) -> String {
    let mut label = tree.tag(node).unwrap_or_default().to_string();
    if let Some(id) = tree.attribute(node, "id").filter(|id| !id.is_empty()) {
        label.push('#');
        label.push_str(id);
    }
    for class in visible_classes(tree, node).split_ascii_whitespace() {
        label.push('.');
        label.push_str(class);
    }
    label
}

/// Blank page titled with its own path
fn page_skeleton(title: &str) -> DomTree {
    let mut tree = DomTree::new();
    let root = tree.root();
    tree.set_attribute(root, "lang", "en");

    let text = |tree: &mut DomTree, parent: NodeId, text: &str| {
        let node = tree.create_text(text);
        tree.append_child(parent, node);
    };
    let element = |tree: &mut DomTree, parent: NodeId, tag: &str| {
        let node = tree.create_element(tag);
        tree.append_child(parent, node);
        node
    };

    if let (Some(head), Some(body)) = (tree.head(), tree.body()) {
        let before_head = tree.create_text("\n");
        tree.insert_child(root, 0, before_head);
        let before_body = tree.create_text("\n");
        tree.insert_child(root, 2, before_body);
        text(&mut tree, root, "\n");

        text(&mut tree, head, "\n  ");
        let charset = element(&mut tree, head, "meta");
        tree.set_attribute(charset, "charset", "UTF-8");
        text(&mut tree, head, "\n  ");
        let viewport = element(&mut tree, head, "meta");
        tree.set_attribute(viewport, "name", "viewport");
        tree.set_attribute(viewport, "content", "width=device-width, initial-scale=1.0");
        text(&mut tree, head, "\n  ");
        let title_node = element(&mut tree, head, "title");
        tree.set_text_content(title_node, title);
        text(&mut tree, head, "\n");

        text(&mut tree, body, "\n  ");
        let main = element(&mut tree, body, "main");
        text(&mut tree, main, "\n    ");
        let heading = element(&mut tree, main, "h1");
        tree.set_text_content(heading, title);
        text(&mut tree, main, "\n    ");
        let paragraph = element(&mut tree, main, "p");
        tree.set_text_content(paragraph, "New page");
        text(&mut tree, main, "\n  ");
        text(&mut tree, body, "\n");
    }
    tree
}
