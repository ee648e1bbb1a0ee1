//! Ordered collection of symbol lines. Logically a doubly linked list, but the
//! nodes live in an arena and link to each other through stable indices, so
//! there are no raw pointers to dangle. Insertion order is preserved until
//! `sort` is called; the sort is stable so name ties keep discovery order.
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ListError {
    #[error("the list is empty")]
    Empty,

    #[error("the front link invariant is broken")]
    InvalidState,

    #[error("couldn't allocate a node")]
    Allocation,
}

struct Node<T> {
    prev: Option<usize>,
    next: Option<usize>,
    item: T,
}

pub struct OrderedList<T> {
    arena: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    len: usize,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        OrderedList::new()
    }
}

impl<T> OrderedList<T> {
    pub fn new() -> OrderedList<T> {
        OrderedList {
            arena: Vec::new(),
            free: Vec::new(),
            head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// O(1). The list takes ownership of `item`.
    pub fn push_front(&mut self, item: T) -> Result<(), ListError> {
        self.check_front()?;
        let idx = self.alloc(Node {
            prev: None,
            next: self.head,
            item,
        })?;
        if let Some(old) = self.head {
            self.node_mut(old)?.prev = Some(idx);
        }
        self.head = Some(idx);
        self.len += 1;
        Ok(())
    }

    /// O(1). Returns ownership of the front item and recycles its slot.
    pub fn pop_front(&mut self) -> Result<T, ListError> {
        let Some(idx) = self.head else {
            return Err(ListError::Empty);
        };
        self.check_front()?;
        let node = self.arena[idx].take().ok_or(ListError::InvalidState)?;
        self.free.push(idx);
        self.head = node.next;
        if let Some(new_head) = self.head {
            self.node_mut(new_head)?.prev = None;
        }
        self.len -= 1;
        Ok(node.item)
    }

    /// Stable insertion sort: nodes are taken in their current order and each
    /// is inserted before the first sorted node that compares strictly
    /// greater, so comparator-equal entries keep their relative order.
    /// A link to a dead slot is reported as `InvalidState`, never a panic.
    pub fn sort<F>(&mut self, mut cmp: F) -> Result<(), ListError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut remaining = self.head;
        let mut sorted_head: Option<usize> = None;
        let mut sorted_tail: Option<usize> = None;

        while let Some(cur) = remaining {
            remaining = self.node(cur).ok_or(ListError::InvalidState)?.next;

            let mut at = sorted_head;
            while let Some(existing) = at {
                if cmp(self.item(cur)?, self.item(existing)?) == Ordering::Less {
                    break;
                }
                at = self.node(existing).ok_or(ListError::InvalidState)?.next;
            }

            match at {
                Some(existing) => {
                    let before = self.node(existing).ok_or(ListError::InvalidState)?.prev;
                    self.node_mut(cur)?.prev = before;
                    self.node_mut(cur)?.next = Some(existing);
                    self.node_mut(existing)?.prev = Some(cur);
                    match before {
                        Some(b) => self.node_mut(b)?.next = Some(cur),
                        None => sorted_head = Some(cur),
                    }
                }
                None => {
                    self.node_mut(cur)?.prev = sorted_tail;
                    self.node_mut(cur)?.next = None;
                    match sorted_tail {
                        Some(t) => self.node_mut(t)?.next = Some(cur),
                        None => sorted_head = Some(cur),
                    }
                    sorted_tail = Some(cur);
                }
            }
        }
        self.head = sorted_head;
        Ok(())
    }

    /// Single pass: the destructor (if supplied) sees every item once, every
    /// slot is freed, and the list is reset to empty.
    pub fn delete_all(&mut self, mut destructor: Option<&mut dyn FnMut(T)>) {
        let mut cur = self.head;
        while let Some(idx) = cur {
            let node = self.arena[idx].take();
            cur = node.as_ref().and_then(|n| n.next);
            if let (Some(del), Some(node)) = (destructor.as_mut(), node) {
                del(node.item);
            }
        }
        self.arena.clear();
        self.free.clear();
        self.head = None;
        self.len = 0;
    }

    /// The head must have no back link before any front-affecting operation.
    /// A violation is reported, never assumed away.
    fn check_front(&self) -> Result<(), ListError> {
        match self.head {
            Some(idx) => match self.node(idx) {
                Some(node) if node.prev.is_none() => Ok(()),
                _ => Err(ListError::InvalidState),
            },
            None => Ok(()),
        }
    }

    fn alloc(&mut self, node: Node<T>) -> Result<usize, ListError> {
        if let Some(idx) = self.free.pop() {
            self.arena[idx] = Some(node);
            return Ok(idx);
        }
        self.arena
            .try_reserve(1)
            .map_err(|_| ListError::Allocation)?;
        self.arena.push(Some(node));
        Ok(self.arena.len() - 1)
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.arena.get(idx).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, idx: usize) -> Result<&mut Node<T>, ListError> {
        self.arena
            .get_mut(idx)
            .and_then(|slot| slot.as_mut())
            .ok_or(ListError::InvalidState)
    }

    fn item(&self, idx: usize) -> Result<&T, ListError> {
        self.node(idx)
            .map(|node| &node.item)
            .ok_or(ListError::InvalidState)
    }
}
