use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};

use super::*;
use crate::config::{LoadContent, WindowEvent, WindowOptions};
use crate::context::BuildContext;
use crate::error::WindowKitError;
use crate::registry::WindowRef;
use crate::shell::HeadlessShell;
use crate::toolkit::{IpcChannel, WindowBuilder, WindowEvents};

struct Prefs;

impl WindowDefinition for Prefs {
    fn define(ctx: &BuildContext) -> Self {
        WindowBuilder::singleton(ctx)
            .setup(WindowOptions::new().set("width", 600).set("title", "Preferences"))
            .file("prefs.html");
        Prefs
    }
}

struct NoteEditor {
    saved: Rc<RefCell<Vec<Value>>>,
}

impl WindowDefinition for NoteEditor {
    fn define(ctx: &BuildContext) -> Self {
        WindowBuilder::new(ctx)
            .setup(WindowOptions::new().set("width", 900))
            .url("http://localhost:3000/editor");

        let saved = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&saved);
        let counter = Rc::clone(&saved);
        IpcChannel::new(ctx)
            .on("note:save", move |_msg, _win, payload| {
                if payload == json!("boom") {
                    anyhow::bail!("unsaveable note");
                }
                sink.borrow_mut().push(payload);
                Ok(())
            })
            .handle("note:count", move |_msg, _win, payload| {
                if payload == json!("boom") {
                    anyhow::bail!("count query failed");
                }
                Ok(json!(counter.borrow().len()))
            });

        NoteEditor { saved }
    }
}

struct Dashboard {
    resizes: Rc<Cell<u32>>,
    readies: Rc<Cell<u32>>,
}

impl WindowDefinition for Dashboard {
    fn define(ctx: &BuildContext) -> Self {
        WindowBuilder::new(ctx).url("http://localhost:3000/dash");

        let resizes = Rc::new(Cell::new(0));
        let readies = Rc::new(Cell::new(0));
        let resize_hits = Rc::clone(&resizes);
        let ready_hits = Rc::clone(&readies);
        WindowEvents::new(ctx)
            .on("resize", move |_event, _win| {
                resize_hits.set(resize_hits.get() + 1);
            })
            .once("ready-to-show", move |_event, win| {
                ready_hits.set(ready_hits.get() + 1);
                win.focus();
            });

        Dashboard { resizes, readies }
    }
}

struct Bare;

impl WindowDefinition for Bare {
    fn define(_ctx: &BuildContext) -> Self {
        Bare
    }
}

fn native_id_of<W>(controller: &WindowController, handle: &WindowHandle<W>) -> u64 {
    controller.registry().get(handle.id()).unwrap().native_id
}

#[test]
fn open_creates_loads_and_registers() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let handle = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();

    assert_eq!(shell.created_count(), 1);
    let native_id = native_id_of(&controller, &handle);
    let window = shell.window_by_id(native_id).unwrap();
    assert_eq!(
        window.loaded(),
        Some(LoadContent::Url {
            url: "http://localhost:3000/editor".into()
        })
    );
    assert_eq!(window.options().get("width"), Some(&json!(900)));
    assert_eq!(
        controller.registry().find_by_native_id(native_id),
        Some(handle.id())
    );
    // Deref reaches the application object
    assert!(handle.saved.borrow().is_empty());
}

#[test]
fn singleton_reopen_focuses_instead_of_creating() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let first = controller.open::<Prefs>(OpenOptions::new()).unwrap();
    let second = controller.open::<Prefs>(OpenOptions::new()).unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(shell.created_count(), 1);
    let window = shell.window_by_id(native_id_of(&controller, &first)).unwrap();
    assert_eq!(window.focus_count(), 1);
}

#[test]
fn closed_singleton_reopens_as_a_fresh_window() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let first = controller.open::<Prefs>(OpenOptions::new()).unwrap();
    controller.close(&first).unwrap();
    assert!(controller.registry().is_empty());

    let second = controller.open::<Prefs>(OpenOptions::new()).unwrap();
    assert_ne!(second.id(), first.id());
    assert_eq!(shell.created_count(), 2);
    assert_eq!(controller.registry().len(), 1);
}

#[test]
fn definition_without_builder_is_an_error() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell);

    let err = controller.open::<Bare>(OpenOptions::new()).unwrap_err();
    assert!(matches!(err, WindowKitError::MissingBuilderConfig { .. }));
}

#[test]
fn messages_reach_only_the_sending_window() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());
    let transport = shell.headless_transport();

    let first = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    let second = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    let first_native = native_id_of(&controller, &first);

    transport.emit_from_window(first_native, "note:save", json!({ "title": "draft" }));

    assert_eq!(first.saved.borrow().len(), 1);
    assert!(second.saved.borrow().is_empty());
}

#[test]
fn message_handler_failure_is_contained() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());
    let transport = shell.headless_transport();

    let handle = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    let native_id = native_id_of(&controller, &handle);

    transport.emit_from_window(native_id, "note:save", json!("boom"));
    // The binding survives a failing handler
    transport.emit_from_window(native_id, "note:save", json!("after"));
    assert_eq!(*handle.saved.borrow(), vec![json!("after")]);
}

#[test]
fn invoke_returns_values_and_propagates_failures() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());
    let transport = shell.headless_transport();

    let handle = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    let native_id = native_id_of(&controller, &handle);

    let count = transport
        .invoke_from_window(native_id, "note:count", json!(null))
        .unwrap();
    assert_eq!(count, json!(0));

    transport.emit_from_window(native_id, "note:save", json!("one"));
    let count = transport
        .invoke_from_window(native_id, "note:count", json!(null))
        .unwrap();
    assert_eq!(count, json!(1));

    assert!(transport
        .invoke_from_window(native_id, "note:count", json!("boom"))
        .is_err());
    // Another window's sender id is rejected by the scope gate
    assert!(transport
        .invoke_from_window(native_id + 99, "note:count", json!(null))
        .is_err());
}

#[test]
fn close_unbinds_transport_and_deregisters() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());
    let transport = shell.headless_transport();

    let handle = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    let native_id = native_id_of(&controller, &handle);
    assert_eq!(transport.message_listener_count("note:save"), 1);
    assert!(transport.has_invoke_handler("note:count"));

    controller.close(&handle).unwrap();

    assert!(controller.registry().is_empty());
    assert!(controller.registry().find_by_native_id(native_id).is_none());
    assert_eq!(transport.message_listener_count("note:save"), 0);
    assert!(!transport.has_invoke_handler("note:count"));

    transport.emit_from_window(native_id, "note:save", json!("late"));
    assert!(handle.saved.borrow().is_empty());
}

#[test]
fn parent_and_modal_reach_the_native_window() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let prefs = controller.open::<Prefs>(OpenOptions::new()).unwrap();
    let prefs_native = native_id_of(&controller, &prefs);

    let child = controller
        .open::<NoteEditor>(OpenOptions::new().parent(&prefs).modal(true))
        .unwrap();
    let child_window = shell.window_by_id(native_id_of(&controller, &child)).unwrap();

    assert_eq!(child_window.parent_id(), Some(prefs_native));
    assert!(child_window.is_modal());
}

#[test]
fn missing_parent_opens_undocked() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let handle = controller
        .open::<NoteEditor>(OpenOptions::new().parent(WindowRef::class::<Prefs>()))
        .unwrap();
    let window = shell.window_by_id(native_id_of(&controller, &handle)).unwrap();

    assert_eq!(window.parent_id(), None);
    assert!(!window.is_modal());
}

#[test]
fn ambiguous_parent_class_aborts_the_open() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    controller.open::<NoteEditor>(OpenOptions::new()).unwrap();

    let err = controller
        .open::<Dashboard>(OpenOptions::new().parent(WindowRef::class::<NoteEditor>()))
        .unwrap_err();
    assert!(matches!(
        err,
        WindowKitError::AmbiguousWindowReference { active_count: 2, .. }
    ));
    // The open never reached the shell
    assert_eq!(shell.created_count(), 2);
    assert_eq!(controller.registry().len(), 2);
}

#[test]
fn send_targets_instance_or_unique_class_and_drops_when_gone() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let handle = controller.open::<Dashboard>(OpenOptions::new()).unwrap();
    let window = shell.window_by_id(native_id_of(&controller, &handle)).unwrap();

    controller.send(&handle, "theme:update", json!("dark")).unwrap();
    controller
        .send(WindowRef::class::<Dashboard>(), "theme:update", json!("dim"))
        .unwrap();
    assert_eq!(
        window.sent(),
        [
            ("theme:update".to_string(), json!("dark")),
            ("theme:update".to_string(), json!("dim")),
        ]
    );

    controller.close(&handle).unwrap();
    controller.send(&handle, "theme:update", json!("light")).unwrap();
    assert_eq!(window.sent().len(), 2);
}

#[test]
fn controller_defaults_merge_beneath_captured_options() {
    let shell = HeadlessShell::new();
    let controller = WindowController::with_defaults(
        shell.clone(),
        WindowOptions::new().set("width", 800).set("frame", true),
    );

    let handle = controller.open::<NoteEditor>(OpenOptions::new()).unwrap();
    let window = shell.window_by_id(native_id_of(&controller, &handle)).unwrap();

    // Captured width wins; untouched default passes through
    assert_eq!(window.options().get("width"), Some(&json!(900)));
    assert_eq!(window.options().get("frame"), Some(&json!(true)));
}

#[test]
fn native_event_bindings_fire_with_the_window_handle() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());

    let handle = controller.open::<Dashboard>(OpenOptions::new()).unwrap();
    let window = shell.window_by_id(native_id_of(&controller, &handle)).unwrap();

    window.emit(&WindowEvent::new("resize"));
    window.emit(&WindowEvent::new("resize"));
    window.emit(&WindowEvent::new("ready-to-show"));
    window.emit(&WindowEvent::new("ready-to-show"));

    assert_eq!(handle.resizes.get(), 2);
    assert_eq!(handle.readies.get(), 1);
    // The once handler focused through its handle
    assert_eq!(window.focus_count(), 1);
}

#[test]
fn handle_debug_output_names_class_and_id() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell);

    let handle = controller.open::<Prefs>(OpenOptions::new()).unwrap();

    let rendered = format!("{:?}", handle);
    assert!(rendered.contains("WindowHandle"));
    assert!(rendered.contains("Prefs"));
    assert!(rendered.contains(&format!("{:?}", handle.id())));
}

#[test]
fn global_ipc_hears_every_sender_until_removed() {
    let shell = HeadlessShell::new();
    let controller = WindowController::new(shell.clone());
    let transport = shell.headless_transport();

    let seen: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let token = controller.global_ipc("telemetry", move |msg, _payload| {
        sink.borrow_mut().push(msg.sender_id);
    });

    transport.emit_from_window(5, "telemetry", json!(1));
    transport.emit_from_window(9, "telemetry", json!(2));
    assert_eq!(*seen.borrow(), vec![5, 9]);

    controller.remove_global_ipc("telemetry", token);
    transport.emit_from_window(5, "telemetry", json!(3));
    assert_eq!(seen.borrow().len(), 2);
}
