//! Test helpers shared by the workspace crates.

use crate::plugin::{EditorKind, Plugin, PluginRegistry, PropertyField, Visual};
use crate::schema::Schema;
use crate::template::{BasePdf, Template};
use kurbo::Point;
use std::cell::RefCell;
use std::sync::Once;

/// A plugin whose render echoes its value, with a small property panel.
pub fn sample_plugin(schema_type: &str) -> Plugin {
    let default_schema = Schema::new(schema_type, Point::ZERO, 40.0, 10.0).with_id("");
    let panel = vec![
        PropertyField::new("name", "Name", EditorKind::Text),
        PropertyField::new("position", "Position", EditorKind::Position),
        PropertyField::new("width", "Width", EditorKind::Number),
        PropertyField::new("height", "Height", EditorKind::Number),
        PropertyField::new(format!("{}Option", schema_type), "Option", EditorKind::Toggle),
    ];
    let element = schema_type.to_string();
    Plugin::new(default_schema, panel, move |ctx| {
        Visual::new(element.clone()).with_text(ctx.value)
    })
}

/// Registry with `text` and `image` sample plugins.
pub fn sample_registry() -> PluginRegistry {
    PluginRegistry::new()
        .with("text", sample_plugin("text"))
        .with("image", sample_plugin("image"))
}

/// One A4 page with text fields `field1`, `field2`, ... laid out vertically.
pub fn sample_template(fields: usize) -> Template {
    let mut template = Template::new(BasePdf::a4());
    for i in 0..fields {
        template.schemas[0].push(
            Schema::new("text", Point::new(20.0, 20.0 + 20.0 * i as f64), 100.0, 15.0)
                .with_id(format!("schema-{}", i + 1))
                .with_name(format!("field{}", i + 1)),
        );
    }
    template
}

/// Minimal executor for futures that complete without a real reactor.
pub fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = record.args().to_string();
        CAPTURED.with(|c| c.borrow_mut().push((record.level(), line)));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Install the capturing logger (once per process) and clear this thread's
/// captured records.
pub fn capture_logs() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
}

/// Drain the records captured on this thread.
pub fn take_logs() -> Vec<(log::Level, String)> {
    CAPTURED.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

/// Captured messages at `error` level.
pub fn take_errors() -> Vec<String> {
    take_logs()
        .into_iter()
        .filter(|(level, _)| *level == log::Level::Error)
        .map(|(_, line)| line)
        .collect()
}
