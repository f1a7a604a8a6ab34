//! FUSE binding for the ticket tree

use crate::error::{Error, Result};
use crate::fs::handle::HandleManager;
use crate::fs::inode::{InodeTable, ROOT_INO};
use crate::fs::node::{DirNode, EntryKind, FileNode, FsContext, Node, NodeAttr};

use fuser::{
    consts::FOPEN_DIRECT_IO, FileAttr, FileType as FuserFileType, Filesystem, ReplyAttr,
    ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::runtime::Runtime;
use tracing::{debug, error};

/// TTL for cached attributes
const TTL: Duration = Duration::from_secs(1);

const BLOCK_SIZE: u32 = 512;

impl EntryKind {
    fn to_fuser(self) -> FuserFileType {
        match self {
            EntryKind::Directory => FuserFileType::Directory,
            EntryKind::File => FuserFileType::RegularFile,
        }
    }
}

impl NodeAttr {
    /// Convert to the fuser attribute record
    pub fn to_fuser(&self, ino: u64) -> FileAttr {
        FileAttr {
            ino,
            size: self.size,
            blocks: self.size.div_ceil(BLOCK_SIZE as u64),
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
            crtime: self.ctime,
            kind: self.kind.to_fuser(),
            perm: self.perm,
            nlink: if self.kind == EntryKind::Directory { 2 } else { 1 },
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }
}

/// Zammad tickets mounted as a filesystem
pub struct TicketFs {
    /// Inode to node mapping
    inodes: InodeTable,
    /// Open file handles
    handles: HandleManager,
    /// Tokio runtime for async operations
    runtime: Runtime,
}

impl TicketFs {
    /// Create the filesystem; `runtime` must be the one the backend's
    /// connections were made on
    pub fn new(ctx: Arc<FsContext>, runtime: Runtime) -> Self {
        TicketFs {
            inodes: InodeTable::new(Node::Dir(ctx.root())),
            handles: HandleManager::new(),
            runtime,
        }
    }

    /// Helper to run async code from sync FUSE callbacks
    fn block_on<F: std::future::Future>(&self, f: F) -> F::Output {
        self.runtime.block_on(f)
    }

    fn node(&self, ino: u64) -> Result<Arc<Node>> {
        self.inodes
            .get(ino)
            .ok_or_else(|| Error::NotFound(format!("inode {}", ino)))
    }

    fn lookup_child(&self, parent: u64, name: &str) -> Result<FileAttr> {
        let node = self.node(parent)?;
        let child = self.block_on(as_dir(&node)?.lookup(name))?;
        let attr = self.block_on(child.attr())?;
        let (ino, _) = self.inodes.insert(child);
        Ok(attr.to_fuser(ino))
    }

    fn attr(&self, ino: u64) -> Result<FileAttr> {
        let node = self.node(ino)?;
        let attr = self.block_on(node.attr())?;
        Ok(attr.to_fuser(ino))
    }

    fn list(&self, ino: u64) -> Result<Vec<(u64, FuserFileType, String)>> {
        let node = self.node(ino)?;
        let dir = as_dir(&node)?;
        let children = self.block_on(dir.read_dir())?;

        // Ticket directories sit directly under the root
        let mut entries = vec![
            (ino, FuserFileType::Directory, ".".to_string()),
            (ROOT_INO, FuserFileType::Directory, "..".to_string()),
        ];
        for child in children {
            let path = format!("{}/{}", dir.path().trim_end_matches('/'), child.name);
            entries.push((self.inodes.ino_for(&path), child.kind.to_fuser(), child.name));
        }
        Ok(entries)
    }

    fn read_file(&self, ino: u64, fh: u64, offset: u64, size: u32) -> Result<Vec<u8>> {
        let held = self
            .handles
            .with_handle_mut(fh, |h| {
                if offset == 0 {
                    h.invalidate();
                }
                h.slice(offset, size).map(<[u8]>::to_vec)
            })
            .flatten();
        if let Some(data) = held {
            return Ok(data);
        }

        let node = self.node(ino)?;
        let content = self.block_on(as_file(&node)?.read())?;
        let start = (offset as usize).min(content.len());
        let end = start.saturating_add(size as usize).min(content.len());
        let data = content[start..end].to_vec();
        self.handles.with_handle_mut(fh, |h| h.set_content(content));
        Ok(data)
    }

    fn write_file(&self, ino: u64, fh: u64, data: &[u8], uid: u32) -> Result<usize> {
        let node = self.node(ino)?;
        let written = self.block_on(as_file(&node)?.write(data, uid))?;
        self.handles.with_handle_mut(fh, |h| h.invalidate());
        Ok(written)
    }
}

fn as_dir(node: &Node) -> Result<&DirNode> {
    match node {
        Node::Dir(d) => Ok(d),
        Node::File(f) => Err(Error::NotADirectory(f.path().to_string())),
    }
}

fn as_file(node: &Node) -> Result<&FileNode> {
    match node {
        Node::File(f) => Ok(f),
        Node::Dir(d) => Err(Error::NotAFile(d.path().to_string())),
    }
}

fn report(op: &str, e: &Error) {
    if e.is_not_found() {
        debug!("{}: {}", op, e);
    } else {
        error!("{} error: {}", op, e);
    }
}

impl Filesystem for TicketFs {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = match name.to_str() {
            Some(n) => n,
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };

        debug!("lookup: parent={}, name={}", parent, name);

        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => {
                report("lookup", &e);
                reply.error(e.to_errno());
            }
        }
    }

    fn forget(&mut self, _req: &Request, ino: u64, _nlookup: u64) {
        self.inodes.forget(ino);
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        debug!("getattr: ino={}", ino);

        match self.attr(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => {
                report("getattr", &e);
                reply.error(e.to_errno());
            }
        }
    }

    /// Accepted without effect so that `echo note > articles` can truncate
    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!("setattr: ino={}, size={:?}", ino, size);

        match self.attr(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => {
                report("setattr", &e);
                reply.error(e.to_errno());
            }
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir: ino={}, offset={}", ino, offset);

        let entries = match self.list(ino) {
            Ok(entries) => entries,
            Err(e) => {
                report("readdir", &e);
                reply.error(e.to_errno());
                return;
            }
        };

        for (i, (ino, kind, name)) in entries.iter().enumerate().skip(offset as usize) {
            if reply.add(*ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }

        reply.ok();
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open: ino={}, flags={}", ino, flags);

        match self.node(ino) {
            Ok(node) => match node.as_ref() {
                Node::Dir(_) => reply.error(libc::EISDIR),
                Node::File(_) => {
                    let fh = self.handles.open(ino);
                    reply.opened(fh, FOPEN_DIRECT_IO);
                }
            },
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read: ino={}, offset={}, size={}", ino, offset, size);

        match self.read_file(ino, fh, offset.max(0) as u64, size) {
            Ok(data) => reply.data(&data),
            Err(e) => {
                report("read", &e);
                reply.error(e.to_errno());
            }
        }
    }

    fn write(
        &mut self,
        req: &Request,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        debug!("write: ino={}, offset={}, size={}", ino, offset, data.len());

        // Offsets are ignored: every write becomes one new article
        match self.write_file(ino, fh, data, req.uid()) {
            Ok(n) => reply.written(n as u32),
            Err(e) => {
                report("write", &e);
                reply.error(e.to_errno());
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        debug!("release: ino={}, fh={}", ino, fh);
        self.handles.close(fh);
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request, _ino: u64, reply: fuser::ReplyStatfs) {
        // Nothing is stored locally
        reply.statfs(
            0,                        // blocks
            0,                        // bfree
            0,                        // bavail
            self.inodes.len() as u64, // files
            0,                        // ffree
            BLOCK_SIZE,               // bsize
            255,                      // namelen
            BLOCK_SIZE,               // frsize
        );
    }
}
