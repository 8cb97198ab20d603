//! A singly linked list.
//!
//! Each node is owned by its predecessor, and the first node by the list
//! itself. Front operations are O(1); back operations walk the chain.
//!
//! # Examples
//!
//! ```
//! use taskloop::list::SinglyLinkedList;
//!
//! let mut list = SinglyLinkedList::new();
//! list.push_front(10.0);
//! list.push_front(2.5);
//! list.push_back(10000.0);
//!
//! assert_eq!(list.pop_front(), Some(2.5));
//! assert_eq!(list.pop_back(), Some(10000.0));
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![10.0]);
//! ```

use std::fmt;

type Link<T> = Option<Box<Node<T>>>;

struct Node<T> {
    value: T,
    next: Link<T>,
}

pub struct SinglyLinkedList<T> {
    head: Link<T>,
    len: usize,
}

impl<T> SinglyLinkedList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Inserts `value` as the new head.
    pub fn push_front(&mut self, value: T) {
        let next = self.head.take();
        self.head = Some(Box::new(Node { value, next }));
        self.len += 1;
    }

    /// Removes the head and returns its value, or `None` if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        self.head.take().map(|node| {
            self.head = node.next;
            self.len -= 1;
            node.value
        })
    }

    /// Appends `value` after the last node.
    pub fn push_back(&mut self, value: T) {
        let mut cursor = &mut self.head;
        while let Some(node) = cursor {
            cursor = &mut node.next;
        }
        *cursor = Some(Box::new(Node { value, next: None }));
        self.len += 1;
    }

    /// Removes the last node and returns its value, or `None` if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        let mut cursor = &mut self.head;
        // Advance until `cursor` is the link holding the final node.
        while cursor.as_ref()?.next.is_some() {
            cursor = &mut cursor.as_mut()?.next;
        }
        let last = cursor.take()?;
        self.len -= 1;
        Some(last.value)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.as_ref().map(|node| &node.value)
    }

    pub fn back(&self) -> Option<&T> {
        self.iter().last()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

impl<T> Default for SinglyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Unlink one node at a time; the derived drop would recurse once per node.
impl<T> Drop for SinglyLinkedList<T> {
    fn drop(&mut self) {
        let mut link = self.head.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

/// Borrowing iterator over a [`SinglyLinkedList`], front to back.
pub struct Iter<'a, T> {
    next: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            self.next = node.next.as_deref();
            &node.value
        })
    }
}

impl<'a, T> IntoIterator for &'a SinglyLinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Extend<T> for SinglyLinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        // Find the tail once instead of walking the chain per element.
        let mut cursor = &mut self.head;
        while let Some(node) = cursor {
            cursor = &mut node.next;
        }
        for value in iter {
            let node = cursor.insert(Box::new(Node { value, next: None }));
            cursor = &mut node.next;
            self.len += 1;
        }
    }
}

impl<T> FromIterator<T> for SinglyLinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T: fmt::Debug> fmt::Debug for SinglyLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// One value per line, front to back.
impl<T: fmt::Display> fmt::Display for SinglyLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self {
            writeln!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<T: Clone>(list: &SinglyLinkedList<T>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn starts_empty() {
        let list: SinglyLinkedList<i32> = SinglyLinkedList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn push_front_prepends() {
        let mut list = SinglyLinkedList::new();
        list.push_front(1);
        list.push_front(2);
        list.push_front(3);
        assert_eq!(values(&list), vec![3, 2, 1]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn push_back_appends() {
        let mut list = SinglyLinkedList::new();
        list.push_back(1);
        list.push_back(2);
        list.push_front(0);
        assert_eq!(values(&list), vec![0, 1, 2]);
        assert_eq!(list.front(), Some(&0));
        assert_eq!(list.back(), Some(&2));
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mut list: SinglyLinkedList<String> = SinglyLinkedList::new();
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn pop_back_single_element_empties_list() {
        let mut list = SinglyLinkedList::new();
        list.push_back("only");
        assert_eq!(list.pop_back(), Some("only"));
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn mixed_operations_match_listing() {
        let mut list = SinglyLinkedList::new();
        list.push_front(10.0);
        list.push_front(2.5);
        list.push_back(10000.0);
        list.push_back(60.64334583);
        assert_eq!(values(&list), vec![2.5, 10.0, 10000.0, 60.64334583]);

        assert_eq!(list.pop_front(), Some(2.5));
        assert_eq!(list.pop_back(), Some(60.64334583));
        assert_eq!(values(&list), vec![10.0, 10000.0]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn display_lists_one_value_per_line() {
        let mut list = SinglyLinkedList::new();
        list.push_back("Hello this is text.".to_owned());
        list.pop_front();
        list.push_front("What is this?".to_owned());
        assert_eq!(list.to_string(), "What is this?\n");
    }

    #[test]
    fn debug_formats_as_list() {
        let list: SinglyLinkedList<_> = [1, 2, 3].into_iter().collect();
        assert_eq!(format!("{list:?}"), "[1, 2, 3]");
    }

    #[test]
    fn extend_appends_in_order() {
        let mut list: SinglyLinkedList<_> = vec![1, 2].into_iter().collect();
        list.extend([3, 4]);
        assert_eq!(values(&list), vec![1, 2, 3, 4]);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn long_list_drops_without_overflow() {
        let list: SinglyLinkedList<u32> = (0..200_000).collect();
        assert_eq!(list.len(), 200_000);
        drop(list);
    }
}
