//! Ticket directory tree
//!
//! The root directory lists actionable tickets, each ticket directory holds
//! six fixed files. Nodes keep a snapshot of the ticket they were built from
//! together with the instant it was fetched; once that snapshot is older than
//! the freshness window it is re-fetched before answering.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fs::content;
use crate::identity::IdentityMapper;
use crate::states::StateTable;
use crate::zammad::{Article, Tag, Ticket, TicketBackend, ACTIONABLE_QUERY};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error};

/// Nominal size reported for directories
const DIR_SIZE: u64 = 12;

const DIR_PERM: u16 = 0o775;
const FILE_PERM: u16 = 0o664;
const READ_ONLY_PERM: u16 = 0o444;

/// The six files present in every ticket directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Title,
    State,
    Id,
    Number,
    Articles,
    Tags,
}

impl FileKind {
    /// Listing order
    pub const ALL: [FileKind; 6] = [
        FileKind::Title,
        FileKind::State,
        FileKind::Id,
        FileKind::Number,
        FileKind::Articles,
        FileKind::Tags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FileKind::Title => "title",
            FileKind::State => "state",
            FileKind::Id => "ID",
            FileKind::Number => "number",
            FileKind::Articles => "articles",
            FileKind::Tags => "tags",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// `state` and `tags` are created writable but only `articles` accepts writes
    pub fn read_only(self) -> bool {
        matches!(self, FileKind::Title | FileKind::Id | FileKind::Number)
    }
}

/// Directory entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One entry returned by [`DirNode::read_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Attributes of a node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttr {
    pub kind: EntryKind,
    pub perm: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
}

impl NodeAttr {
    fn for_ticket(kind: EntryKind, perm: u16, size: u64, ticket: &Ticket) -> Self {
        NodeAttr {
            kind,
            perm,
            uid: ticket.owner_id as u32,
            gid: ticket.group_id as u32,
            size,
            atime: ticket.last_contact(),
            mtime: ticket.updated(),
            ctime: ticket.created(),
        }
    }
}

/// A value paired with the instant it was fetched
#[derive(Debug, Clone, Default)]
struct Stamped<T> {
    value: T,
    refreshed_at: Option<Instant>,
}

impl<T> Stamped<T> {
    fn new(value: T, refreshed_at: Option<Instant>) -> Self {
        Stamped { value, refreshed_at }
    }

    fn set(&mut self, value: T) {
        self.value = value;
        self.refreshed_at = Some(Instant::now());
    }
}

/// Tickets last returned by the root search, shared by the root node
#[derive(Debug, Default)]
pub struct TicketListing {
    inner: Mutex<Stamped<Vec<Ticket>>>,
}

/// State shared by every node of one mount
pub struct FsContext {
    backend: Arc<dyn TicketBackend>,
    states: Arc<StateTable>,
    identities: IdentityMapper,
    base_url: String,
    freshness: Duration,
    search_limit: u32,
}

impl FsContext {
    pub fn new(
        backend: Arc<dyn TicketBackend>,
        states: Arc<StateTable>,
        identities: IdentityMapper,
        base_url: impl Into<String>,
        freshness: Duration,
        search_limit: u32,
    ) -> Arc<Self> {
        Arc::new(FsContext {
            backend,
            states,
            identities,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            freshness,
            search_limit,
        })
    }

    pub fn from_config(
        config: &Config,
        backend: Arc<dyn TicketBackend>,
        states: Arc<StateTable>,
    ) -> Arc<Self> {
        Self::new(
            backend,
            states,
            IdentityMapper::new(&config.identity),
            config.base_url(),
            config.freshness(),
            config.zammad.search_limit,
        )
    }

    /// Root directory of the mount; nothing is fetched until it is listed
    pub fn root(self: &Arc<Self>) -> DirNode {
        DirNode {
            path: "/".to_string(),
            name: String::new(),
            ctx: Arc::clone(self),
            kind: DirKind::Root(Arc::new(TicketListing::default())),
        }
    }

    fn is_stale(&self, refreshed_at: Option<Instant>) -> bool {
        match refreshed_at {
            Some(at) => at.elapsed() > self.freshness,
            None => true,
        }
    }

    async fn fetch_ticket(&self, id: u64) -> Result<Ticket> {
        self.backend
            .get_ticket(id)
            .await?
            .filter(|t| t.id != 0)
            .ok_or(Error::TicketNotFound(id))
    }

    /// Current ticket of a snapshot, re-fetched when stale
    async fn refresh(&self, cell: &Mutex<Stamped<Ticket>>, path: &str) -> Result<Ticket> {
        let (id, age) = {
            let c = cell.lock();
            if !self.is_stale(c.refreshed_at) {
                return Ok(c.value.clone());
            }
            (c.value.id, c.refreshed_at.map(|at| at.elapsed()))
        };

        debug!("{}: stale ({:?}), requerying ticket {}", path, age, id);
        let ticket = self.fetch_ticket(id).await?;
        cell.lock().set(ticket.clone());
        Ok(ticket)
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Parse a directory name as a ticket id; only plain decimal digits are
/// accepted and zero is rejected
pub fn parse_ticket_id(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u64>().ok().filter(|id| *id != 0)
}

/// A node in the tree
pub enum Node {
    Dir(DirNode),
    File(FileNode),
}

impl Node {
    pub fn path(&self) -> &str {
        match self {
            Node::Dir(d) => &d.path,
            Node::File(f) => &f.path,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Node::Dir(_) => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        }
    }

    pub async fn attr(&self) -> Result<NodeAttr> {
        match self {
            Node::Dir(d) => Ok(d.attr()),
            Node::File(f) => f.attr().await,
        }
    }
}

enum DirKind {
    Root(Arc<TicketListing>),
    Ticket(Mutex<Stamped<Ticket>>),
}

/// The root directory or one ticket directory
pub struct DirNode {
    path: String,
    name: String,
    ctx: Arc<FsContext>,
    kind: DirKind,
}

impl DirNode {
    fn ticket_dir(&self, ticket: Ticket, refreshed_at: Option<Instant>) -> DirNode {
        let name = ticket.id.to_string();
        DirNode {
            path: join_path(&self.path, &name),
            name,
            ctx: Arc::clone(&self.ctx),
            kind: DirKind::Ticket(Mutex::new(Stamped::new(ticket, refreshed_at))),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, DirKind::Root(_))
    }

    /// Ticket id bound to this directory, 0 for the root
    pub fn ticket_id(&self) -> u64 {
        match &self.kind {
            DirKind::Root(_) => 0,
            DirKind::Ticket(cell) => cell.lock().value.id,
        }
    }

    /// Resolve a child by name
    ///
    /// Under the root any ticket id resolves, listed or not: a fresh listing
    /// answers directly, anything else is fetched from Zammad.
    pub async fn lookup(&self, name: &str) -> Result<Node> {
        debug!("lookup: {} {:?}", self.path, name);

        let listing = match &self.kind {
            DirKind::Ticket(cell) => {
                let kind = FileKind::from_name(name)
                    .ok_or_else(|| Error::NotFound(join_path(&self.path, name)))?;
                let snapshot = cell.lock().clone();
                return Ok(Node::File(FileNode::new(
                    &self.path,
                    kind,
                    snapshot,
                    Arc::clone(&self.ctx),
                )));
            }
            DirKind::Root(listing) => listing,
        };

        let id = parse_ticket_id(name).ok_or_else(|| Error::NotFound(join_path(&self.path, name)))?;

        let cached = {
            let l = listing.inner.lock();
            if self.ctx.is_stale(l.refreshed_at) {
                None
            } else {
                l.value
                    .iter()
                    .find(|t| t.id == id)
                    .cloned()
                    .map(|t| (t, l.refreshed_at))
            }
        };
        if let Some((ticket, refreshed_at)) = cached {
            return Ok(Node::Dir(self.ticket_dir(ticket, refreshed_at)));
        }

        debug!("lookup: ticket {} not in fresh listing, fetching", id);
        let ticket = self.ctx.fetch_ticket(id).await?;
        Ok(Node::Dir(self.ticket_dir(ticket, Some(Instant::now()))))
    }

    /// List the directory
    pub async fn read_dir(&self) -> Result<Vec<DirEntry>> {
        debug!("read_dir: {}", self.path);

        match &self.kind {
            DirKind::Root(listing) => {
                let tickets = self.refresh_listing(listing).await?;
                Ok(tickets
                    .iter()
                    .map(|t| DirEntry {
                        name: t.id.to_string(),
                        kind: EntryKind::Directory,
                    })
                    .collect())
            }
            DirKind::Ticket(cell) => {
                self.ctx.refresh(cell, &self.path).await?;
                Ok(FileKind::ALL
                    .iter()
                    .map(|k| DirEntry {
                        name: k.name().to_string(),
                        kind: EntryKind::File,
                    })
                    .collect())
            }
        }
    }

    async fn refresh_listing(&self, listing: &TicketListing) -> Result<Vec<Ticket>> {
        let age = {
            let l = listing.inner.lock();
            if !self.ctx.is_stale(l.refreshed_at) {
                return Ok(l.value.clone());
            }
            l.refreshed_at.map(|at| at.elapsed())
        };

        debug!("{}: stale ({:?}), requerying ticket list", self.path, age);
        let tickets = self
            .ctx
            .backend
            .search_tickets(ACTIONABLE_QUERY, self.ctx.search_limit)
            .await?;
        listing.inner.lock().set(tickets.clone());
        Ok(tickets)
    }

    /// Attributes; ownership and times come from the bound ticket
    pub fn attr(&self) -> NodeAttr {
        let ticket = match &self.kind {
            DirKind::Root(_) => Ticket::default(),
            DirKind::Ticket(cell) => cell.lock().value.clone(),
        };
        NodeAttr::for_ticket(EntryKind::Directory, DIR_PERM, DIR_SIZE, &ticket)
    }
}

/// One of the six files of a ticket directory
pub struct FileNode {
    path: String,
    kind: FileKind,
    ctx: Arc<FsContext>,
    ticket: Mutex<Stamped<Ticket>>,
    articles: Mutex<Vec<Article>>,
    tags: Mutex<Vec<Tag>>,
}

impl FileNode {
    fn new(parent: &str, kind: FileKind, ticket: Stamped<Ticket>, ctx: Arc<FsContext>) -> Self {
        FileNode {
            path: join_path(parent, kind.name()),
            kind,
            ctx,
            ticket: Mutex::new(ticket),
            articles: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn read_only(&self) -> bool {
        self.kind.read_only()
    }

    /// Articles fetched by the last read of an `articles` file
    #[cfg(test)]
    pub fn cached_articles(&self) -> Vec<Article> {
        self.articles.lock().clone()
    }

    /// Tags fetched by the last read of a `tags` file
    #[cfg(test)]
    pub fn cached_tags(&self) -> Vec<Tag> {
        self.tags.lock().clone()
    }

    /// Attributes; the size is that of the content a read would return
    pub async fn attr(&self) -> Result<NodeAttr> {
        debug!("attr: {}", self.path);
        let ticket = self.ctx.refresh(&self.ticket, &self.path).await?;
        let size = self.materialize(&ticket).await?.len() as u64;
        let perm = if self.read_only() { READ_ONLY_PERM } else { FILE_PERM };
        Ok(NodeAttr::for_ticket(EntryKind::File, perm, size, &ticket))
    }

    /// Full file content
    pub async fn read(&self) -> Result<Vec<u8>> {
        debug!("read: {}", self.path);
        let ticket = self.ctx.refresh(&self.ticket, &self.path).await?;
        self.materialize(&ticket).await
    }

    /// Articles and tags are always fetched anew
    async fn materialize(&self, ticket: &Ticket) -> Result<Vec<u8>> {
        Ok(match self.kind {
            FileKind::Title => content::title(ticket),
            FileKind::State => content::state(ticket, &self.ctx.states),
            FileKind::Id => content::id_link(ticket, &self.ctx.base_url),
            FileKind::Number => content::number(ticket),
            FileKind::Articles => {
                let articles = self.ctx.backend.list_articles(ticket.id).await?;
                let out = content::articles(&articles);
                *self.articles.lock() = articles;
                out
            }
            FileKind::Tags => {
                let tags = self.ctx.backend.list_tags(ticket.id).await?;
                let out = content::tags(&tags);
                *self.tags.lock() = tags;
                out
            }
        })
    }

    /// Post `data` as a new internal note; only `articles` accepts writes
    pub async fn write(&self, data: &[u8], uid: u32) -> Result<usize> {
        debug!("write: {} ({} bytes, uid {})", self.path, data.len(), uid);
        if self.kind != FileKind::Articles {
            return Err(Error::NotImplemented(format!("write to {}", self.path)));
        }

        let ticket_id = self.ticket.lock().value.id;
        let author = self.ctx.identities.resolve(uid);
        let article = content::article_for_write(ticket_id, author, data);

        self.ctx.backend.create_article(&article).await.map_err(|e| {
            error!("Failed to write article to ticket {}: {}", ticket_id, e);
            e
        })?;
        Ok(data.len())
    }
}

#[cfg(test)]
impl DirNode {
    fn backdate(&self, by: Duration) {
        let shift = |at: Option<Instant>| at.and_then(|t| t.checked_sub(by));
        match &self.kind {
            DirKind::Root(listing) => {
                let mut l = listing.inner.lock();
                l.refreshed_at = shift(l.refreshed_at);
            }
            DirKind::Ticket(cell) => {
                let mut c = cell.lock();
                c.refreshed_at = shift(c.refreshed_at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityConfig;
    use crate::zammad::memory::MemoryBackend;

    const WINDOW: Duration = Duration::from_secs(5);

    fn ticket(id: u64, number: &str, title: &str, state_id: u64) -> Ticket {
        Ticket {
            id,
            number: number.to_string(),
            title: title.to_string(),
            state_id,
            group_id: 1,
            owner_id: 13,
            ..Default::default()
        }
    }

    fn setup() -> (Arc<MemoryBackend>, Arc<FsContext>) {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_ticket(ticket(42, "2024-001", "Printer jam", 2));
        backend.insert_ticket(ticket(43, "2024-002", "VPN down", 1));
        backend.insert_ticket(ticket(50, "2024-009", "Old laptop", 4));

        let states = Arc::new(StateTable::from_states(backend.states.clone()));
        let ctx = FsContext::new(
            backend.clone(),
            states,
            IdentityMapper::new(&IdentityConfig::default()),
            "https://helpdesk.example.org/",
            WINDOW,
            10_000,
        );
        (backend, ctx)
    }

    fn dir(node: Node) -> DirNode {
        match node {
            Node::Dir(d) => d,
            Node::File(f) => panic!("expected directory, got file {}", f.path()),
        }
    }

    fn file(node: Node) -> FileNode {
        match node {
            Node::File(f) => f,
            Node::Dir(d) => panic!("expected file, got directory {}", d.path()),
        }
    }

    async fn open_file(ctx: &Arc<FsContext>, id: u64, name: &str) -> FileNode {
        let root = ctx.root();
        let ticket_dir = dir(root.lookup(&id.to_string()).await.unwrap());
        file(ticket_dir.lookup(name).await.unwrap())
    }

    #[tokio::test]
    async fn test_root_is_lazy() {
        let (backend, ctx) = setup();
        let root = ctx.root();

        assert!(root.is_root());
        assert_eq!(root.path(), "/");
        assert_eq!(root.ticket_id(), 0);
        assert_eq!(MemoryBackend::count(&backend.calls.search), 0);
    }

    #[tokio::test]
    async fn test_root_lists_actionable_tickets() {
        let (backend, ctx) = setup();
        let root = ctx.root();

        let entries = root.read_dir().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["42", "43"]);
        assert!(entries.iter().all(|e| e.kind == EntryKind::Directory));

        root.read_dir().await.unwrap();
        assert_eq!(MemoryBackend::count(&backend.calls.search), 1);
    }

    #[tokio::test]
    async fn test_listing_freshness_boundary() {
        let (backend, ctx) = setup();
        let root = ctx.root();
        root.read_dir().await.unwrap();

        root.backdate(WINDOW - Duration::from_millis(100));
        root.read_dir().await.unwrap();
        assert_eq!(MemoryBackend::count(&backend.calls.search), 1);

        root.backdate(Duration::from_millis(200));
        root.read_dir().await.unwrap();
        assert_eq!(MemoryBackend::count(&backend.calls.search), 2);
    }

    #[tokio::test]
    async fn test_lookup_from_fresh_listing_skips_fetch() {
        let (backend, ctx) = setup();
        let root = ctx.root();
        root.read_dir().await.unwrap();

        let d = dir(root.lookup("42").await.unwrap());
        assert_eq!(d.path(), "/42");
        assert_eq!(d.name(), "42");
        assert_eq!(d.ticket_id(), 42);
        assert_eq!(MemoryBackend::count(&backend.calls.get_ticket), 0);
    }

    #[tokio::test]
    async fn test_lookup_unlisted_ticket_fetches_directly() {
        let (backend, ctx) = setup();
        let root = ctx.root();
        let listed = root.read_dir().await.unwrap();
        assert!(!listed.iter().any(|e| e.name == "50"));

        let d = dir(root.lookup("50").await.unwrap());
        assert_eq!(d.ticket_id(), 50);
        assert_eq!(MemoryBackend::count(&backend.calls.get_ticket), 1);
    }

    #[tokio::test]
    async fn test_lookup_with_stale_listing_fetches() {
        let (backend, ctx) = setup();
        let root = ctx.root();

        dir(root.lookup("42").await.unwrap());
        assert_eq!(MemoryBackend::count(&backend.calls.get_ticket), 1);
        assert_eq!(MemoryBackend::count(&backend.calls.search), 0);
    }

    #[tokio::test]
    async fn test_lookup_invalid_names() {
        let (backend, ctx) = setup();
        let root = ctx.root();

        for name in ["0", "abc", "-1", "+42", " 42", "", "title"] {
            let err = root.lookup(name).await.err().unwrap();
            assert!(err.is_not_found(), "{:?} should not resolve", name);
        }
        assert_eq!(MemoryBackend::count(&backend.calls.get_ticket), 0);

        let err = root.lookup("999").await.err().unwrap();
        assert!(matches!(err, Error::TicketNotFound(999)));
    }

    #[tokio::test]
    async fn test_root_does_not_resolve_file_names() {
        let (backend, ctx) = setup();
        let root = ctx.root();
        root.read_dir().await.unwrap();

        // The root binds no ticket, so the six file names only exist one level down
        for kind in FileKind::ALL {
            let err = root.lookup(kind.name()).await.err().unwrap();
            assert!(matches!(err, Error::NotFound(_)), "{:?}", kind);
        }
        assert_eq!(MemoryBackend::count(&backend.calls.get_ticket), 0);
    }

    #[tokio::test]
    async fn test_ticket_dir_lists_six_files_in_order() {
        let (_backend, ctx) = setup();
        let root = ctx.root();

        for id in ["42", "43"] {
            let d = dir(root.lookup(id).await.unwrap());
            let entries = d.read_dir().await.unwrap();
            let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
            assert_eq!(names, vec!["title", "state", "ID", "number", "articles", "tags"]);
            assert!(entries.iter().all(|e| e.kind == EntryKind::File));
        }
    }

    #[tokio::test]
    async fn test_ticket_dir_unknown_child() {
        let (_backend, ctx) = setup();
        let d = dir(ctx.root().lookup("42").await.unwrap());

        assert!(d.lookup("43").await.err().unwrap().is_not_found());
        assert!(d.lookup("Title").await.err().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_stale_ticket_dir_of_deleted_ticket() {
        let (backend, ctx) = setup();
        let d = dir(ctx.root().lookup("42").await.unwrap());

        backend.tickets.lock().remove(&42);
        d.backdate(WINDOW + Duration::from_millis(100));

        let err = d.read_dir().await.err().unwrap();
        assert!(matches!(err, Error::TicketNotFound(42)));
    }

    #[tokio::test]
    async fn test_file_lookup_is_lazy_and_inherits_freshness() {
        let (backend, ctx) = setup();
        let f = open_file(&ctx, 42, "title").await;
        let fetches = MemoryBackend::count(&backend.calls.get_ticket);

        assert_eq!(f.path(), "/42/title");
        assert_eq!(f.read().await.unwrap(), b"Printer jam\n");
        assert_eq!(MemoryBackend::count(&backend.calls.get_ticket), fetches);
    }

    #[tokio::test]
    async fn test_read_only_flags() {
        let (_backend, ctx) = setup();
        let d = dir(ctx.root().lookup("42").await.unwrap());

        for kind in FileKind::ALL {
            let f = file(d.lookup(kind.name()).await.unwrap());
            let attr = f.attr().await.unwrap();
            let expected = if kind.read_only() { 0o444 } else { 0o664 };
            assert_eq!(attr.perm, expected, "{}", kind.name());
        }
        assert!(FileKind::Title.read_only());
        assert!(FileKind::Id.read_only());
        assert!(FileKind::Number.read_only());
        assert!(!FileKind::State.read_only());
        assert!(!FileKind::Articles.read_only());
        assert!(!FileKind::Tags.read_only());
    }

    #[tokio::test]
    async fn test_scalar_file_contents() {
        let (_backend, ctx) = setup();

        assert_eq!(open_file(&ctx, 42, "title").await.read().await.unwrap(), b"Printer jam\n");
        assert_eq!(open_file(&ctx, 42, "state").await.read().await.unwrap(), b"open");
        assert_eq!(
            open_file(&ctx, 42, "ID").await.read().await.unwrap(),
            b"https://helpdesk.example.org/#ticket/zoom/42\n"
        );
        assert_eq!(open_file(&ctx, 42, "number").await.read().await.unwrap(), b"2024-001\n");
    }

    #[tokio::test]
    async fn test_title_reads_are_idempotent() {
        let (_backend, ctx) = setup();
        let f = open_file(&ctx, 42, "title").await;

        let first = f.read().await.unwrap();
        let second = f.read().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_file_refreshes_after_window() {
        let (backend, ctx) = setup();
        let root = ctx.root();
        let d = dir(root.lookup("42").await.unwrap());
        backend.set_title(42, "Printer fixed");

        let f = file(d.lookup("title").await.unwrap());
        assert_eq!(f.read().await.unwrap(), b"Printer jam\n");

        d.backdate(WINDOW + Duration::from_millis(100));
        let f = file(d.lookup("title").await.unwrap());
        assert_eq!(f.read().await.unwrap(), b"Printer fixed\n");
    }

    #[tokio::test]
    async fn test_articles_always_refetched() {
        let (backend, ctx) = setup();
        let f = open_file(&ctx, 42, "articles").await;

        assert!(f.read().await.unwrap().is_empty());
        backend.add_article(Article {
            ticket_id: 42,
            from: "alice".into(),
            to: "helpdesk".into(),
            body: "It is stuck.".into(),
            ..Default::default()
        });

        let out = String::from_utf8(f.read().await.unwrap()).unwrap();
        assert_eq!(out, "From: alice\nTo: helpdesk\npublic\n\nIt is stuck.\n");
        assert_eq!(f.cached_articles().len(), 1);
        assert_eq!(MemoryBackend::count(&backend.calls.list_articles), 2);
    }

    #[tokio::test]
    async fn test_tags_file() {
        let (backend, ctx) = setup();
        backend.set_tags(42, &["printer", "urgent"]);
        let f = open_file(&ctx, 42, "tags").await;

        assert_eq!(f.read().await.unwrap(), b"printer\nurgent\n");
        assert_eq!(f.cached_tags().len(), 2);
    }

    #[tokio::test]
    async fn test_attr_size_matches_content() {
        let (backend, ctx) = setup();
        backend.set_tags(42, &["printer"]);

        for kind in FileKind::ALL {
            let f = open_file(&ctx, 42, kind.name()).await;
            let attr = f.attr().await.unwrap();
            assert_eq!(attr.size, f.read().await.unwrap().len() as u64, "{}", kind.name());
            assert_eq!(attr.kind, EntryKind::File);
            assert_eq!(attr.uid, 13);
            assert_eq!(attr.gid, 1);
        }
    }

    #[tokio::test]
    async fn test_dir_attr() {
        let (_backend, ctx) = setup();
        let root = ctx.root();

        let attr = root.attr();
        assert_eq!(attr.kind, EntryKind::Directory);
        assert_eq!(attr.perm, 0o775);
        assert_eq!(attr.size, 12);
        assert_eq!(attr.uid, 0);

        let attr = Node::Dir(dir(root.lookup("42").await.unwrap())).attr().await.unwrap();
        assert_eq!(attr.uid, 13);
        assert_eq!(attr.gid, 1);
    }

    #[tokio::test]
    async fn test_write_then_read_articles() {
        let (backend, ctx) = setup();
        let f = open_file(&ctx, 42, "articles").await;

        let body = b"Replaced the fuser unit.";
        assert_eq!(f.write(body, 4_000_000_000).await.unwrap(), body.len());
        assert_eq!(MemoryBackend::count(&backend.calls.create_article), 1);

        let out = String::from_utf8(f.read().await.unwrap()).unwrap();
        assert!(out.contains("\nReplaced the fuser unit.\n"));
        assert!(out.contains("Subject: From ticketfs\n"));
        assert!(out.contains("internal\n"));
    }

    #[tokio::test]
    async fn test_write_to_other_files_not_supported() {
        let (backend, ctx) = setup();

        for name in ["title", "state", "ID", "number", "tags"] {
            let f = open_file(&ctx, 42, name).await;
            let err = f.write(b"closed", 0).await.err().unwrap();
            assert!(matches!(err, Error::NotImplemented(_)), "{}", name);
            assert_eq!(err.to_errno(), libc::ENOSYS);
        }
        assert_eq!(MemoryBackend::count(&backend.calls.create_article), 0);
    }

    #[tokio::test]
    async fn test_remote_failures_propagate() {
        let (backend, ctx) = setup();
        let root = ctx.root();
        let f = open_file(&ctx, 42, "articles").await;
        backend.set_failing(true);

        let err = root.read_dir().await.err().unwrap();
        assert!(matches!(err, Error::Api { status: 503, .. }));

        let err = root.lookup("42").await.err().unwrap();
        assert!(!err.is_not_found());

        assert!(f.read().await.is_err());
        assert!(f.write(b"note", 0).await.is_err());
    }

    #[test]
    fn test_parse_ticket_id() {
        assert_eq!(parse_ticket_id("42"), Some(42));
        assert_eq!(parse_ticket_id("0"), None);
        assert_eq!(parse_ticket_id("4x"), None);
        assert_eq!(parse_ticket_id("-1"), None);
        assert_eq!(parse_ticket_id("+42"), None);
        assert_eq!(parse_ticket_id("42 "), None);
        assert_eq!(parse_ticket_id("99999999999999999999"), None);
    }

    #[test]
    fn test_file_kind_names() {
        for kind in FileKind::ALL {
            assert_eq!(FileKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FileKind::from_name("id"), None);
    }
}
