use hyphae::{
    list::{Error, Links},
    Linked, List, Node, Queue,
};
use std::pin::Pin;

mod util;

#[derive(Debug)]
struct Entry {
    links: Links<Entry>,
    name: char,
}

unsafe impl Linked<Links<Self>> for Entry {
    fn links(&self) -> &Links<Self> {
        &self.links
    }
}

fn entry(name: char) -> Pin<Box<Entry>> {
    Box::pin(Entry {
        links: Links::new(),
        name,
    })
}

fn names(list: &List<'_, Entry>) -> String {
    list.each().map(|entry| entry.name).collect()
}

#[test]
fn append_and_prepend_order() {
    util::trace_init();
    let (a, b, c) = (entry('a'), entry('b'), entry('c'));

    let appended = List::new();
    appended.append(a.as_ref());
    appended.append(b.as_ref());
    appended.append(c.as_ref());
    assert_eq!(names(&appended), "abc");
    drop(appended);

    let prepended = List::new();
    prepended.prepend(a.as_ref());
    prepended.prepend(b.as_ref());
    prepended.prepend(c.as_ref());
    assert_eq!(names(&prepended), "cba");
}

#[test]
fn delete_keeps_order() {
    util::trace_init();
    let (a, b, c) = (entry('a'), entry('b'), entry('c'));
    let list = List::new();
    list.append(a.as_ref());
    list.append(b.as_ref());
    list.append(c.as_ref());

    assert_eq!(list.delete(&b), Ok(()));
    assert_eq!(names(&list), "ac");
    assert!(!b.is_linked());
    list.assert_valid();
}

#[test]
fn deleting_visited_node_during_enumeration() {
    util::trace_init();
    let (a, b, c) = (entry('a'), entry('b'), entry('c'));
    let list = List::new();
    list.append(a.as_ref());
    list.append(b.as_ref());
    list.append(c.as_ref());

    let mut seen = String::new();
    for entry in list.each() {
        if entry.name == 'b' {
            list.delete(&a).unwrap();
        }
        seen.push(entry.name);
    }

    assert_eq!(seen, "abc");
    assert_eq!(names(&list), "bc");
}

#[test]
fn double_delete_errors_differ() {
    util::trace_init();
    let (a, b) = (entry('a'), entry('b'));
    let list = List::new();
    list.append(a.as_ref());
    list.append(b.as_ref());

    list.delete(&a).unwrap();
    assert_eq!(list.delete(&a), Err(Error::NotInList));
    assert_eq!(names(&list), "b");

    b.delete().unwrap();
    assert_eq!(b.delete(), Err(Error::NoSuchOperation));
    assert!(list.is_empty());
}

#[derive(Debug)]
struct Subscriber {
    links: Links<Subscriber>,
    inbox: Queue<u32>,
    /// The last message this subscriber wants.
    until: u32,
}

unsafe impl Linked<Links<Self>> for Subscriber {
    fn links(&self) -> &Links<Self> {
        &self.links
    }
}

#[test]
fn subscribers_unsubscribe_while_broadcasting() {
    util::trace_init();
    let subscribers = [1, 3, 2, 3]
        .into_iter()
        .map(|until| {
            Box::pin(Subscriber {
                links: Links::new(),
                inbox: Queue::new(),
                until,
            })
        })
        .collect::<Vec<_>>();

    let list = List::new();
    for subscriber in &subscribers {
        list.append(subscriber.as_ref());
    }

    for message in 1..=5 {
        for subscriber in list.each() {
            subscriber.inbox.push(message);
            if message == subscriber.until {
                subscriber.delete().unwrap();
            }
        }
        list.assert_valid();
    }

    assert!(list.is_empty());
    for subscriber in &subscribers {
        let received =
            std::iter::from_fn(|| subscriber.inbox.try_dequeue()).collect::<Vec<_>>();
        let expected = (1..=subscriber.until).collect::<Vec<_>>();
        assert_eq!(received, expected);
    }
}
