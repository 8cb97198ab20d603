//! Push and pop at both ends of a `SinglyLinkedList`, listing it after each step.
//!
//! Run with:
//!
//! ```sh
//! cargo run --example linked_list
//! ```

use std::fmt::Display;

use taskloop::SinglyLinkedList;

fn list_nodes<T: Display>(list: &SinglyLinkedList<T>) {
    println!("\nListing all nodes:");
    print!("{list}");
}

fn main() {
    let mut numbers = SinglyLinkedList::new();
    numbers.push_front(10.0);
    numbers.push_front(3.5);
    numbers.push_back(10000.0);
    numbers.push_back(60.64334583);
    list_nodes(&numbers);
    numbers.pop_front();
    list_nodes(&numbers);
    numbers.pop_back();
    list_nodes(&numbers);

    let mut text = SinglyLinkedList::new();
    text.push_back(String::from("Hello this is text."));
    list_nodes(&text);
    text.pop_front();
    text.push_front(String::from("What is this?"));
    list_nodes(&text);
}
