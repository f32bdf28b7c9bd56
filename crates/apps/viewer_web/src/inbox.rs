//! Queue between browser callbacks and the per-frame update.
//!
//! DOM listeners and async loads cannot borrow the viewer, so they push here
//! and `GlobeApp::frame` drains the queue before stepping the viewer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use runtime::HostEvent;

/// RGBA8 pixels, rows top (north) first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0 && self.rgba.len() == (self.width * self.height * 4) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(HostEvent),
    Texture { url: String, image: DecodedImage },
}

/// Shared single-threaded FIFO; clones refer to the same queue.
#[derive(Debug, Clone, Default)]
pub struct Inbox(Rc<RefCell<VecDeque<Inbound>>>);

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: Inbound) {
        self.0.borrow_mut().push_back(item);
    }

    pub fn push_event(&self, event: HostEvent) {
        self.push(Inbound::Event(event));
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Takes everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Inbound> {
        self.0.borrow_mut().drain(..).collect()
    }

    /// Keeps only the latest pointer move among consecutive moves.
    pub fn drain_coalesced(&self) -> Vec<Inbound> {
        let mut out: Vec<Inbound> = Vec::with_capacity(self.len());
        for item in self.drain() {
            let is_move = matches!(item, Inbound::Event(HostEvent::PointerMove { .. }));
            let last_is_move = matches!(out.last(), Some(Inbound::Event(HostEvent::PointerMove { .. })));
            if is_move && last_is_move {
                out.pop();
            }
            out.push(item);
        }
        out
    }
}
