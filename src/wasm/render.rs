//! Browser driver: animation-frame chain, DOM listeners and timers around an
//! [`Effect`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, Event, EventTarget, HtmlCanvasElement, IntersectionObserver, IntersectionObserverEntry,
    MouseEvent,
};

use crate::effect::{
    Effect, FrameRequest, Viewport, LOADED_CLASS, PARENT_LOADED_DELAY_MS, SCROLL_SETTLE_MS,
};
use crate::error::HikariError;
use crate::gl::WebGl;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

struct Observer {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

struct Shared<E> {
    effect: RefCell<E>,
    canvas: RefCell<Option<HtmlCanvasElement>>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    settle: RefCell<Option<Closure<dyn FnMut()>>>,
    scroll_timer: Cell<Option<i32>>,
    listeners: RefCell<Vec<Listener>>,
    observer: RefCell<Option<Observer>>,
}

/// Owns one effect and everything the browser needs to animate it.
pub struct Runtime<E> {
    shared: Rc<Shared<E>>,
}

impl<E> Clone for Runtime<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

fn measure(canvas: &HtmlCanvasElement) -> Viewport {
    let win = window();
    let dimension = |v: Option<Result<JsValue, JsValue>>| {
        v.and_then(Result::ok)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
    };
    let width = dimension(win.as_ref().map(|w| w.inner_width()));
    let height = match canvas.client_height() {
        h if h > 0 => h as f32,
        _ => dimension(win.as_ref().map(|w| w.inner_height())),
    };
    Viewport::new(width, height)
}

fn document_hidden() -> bool {
    window()
        .and_then(|w| w.document())
        .is_some_and(|d| d.hidden())
}

impl<E: Effect<WebGl> + 'static> Runtime<E> {
    pub fn new(effect: E) -> Self {
        Self {
            shared: Rc::new(Shared {
                effect: RefCell::new(effect),
                canvas: RefCell::new(None),
                frame: RefCell::new(None),
                settle: RefCell::new(None),
                scroll_timer: Cell::new(None),
                listeners: RefCell::new(Vec::new()),
                observer: RefCell::new(None),
            }),
        }
    }

    pub fn with_effect<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.shared.effect.borrow_mut())
    }

    /// Resolves `selector` and starts the effect. `Ok(false)` when nothing
    /// matches: the effect stays uninitialized.
    pub fn connect(&self, selector: &str) -> Result<bool, HikariError> {
        if self.shared.effect.borrow().is_connected() {
            return Ok(true);
        }
        let document = window()
            .and_then(|w| w.document())
            .ok_or_else(|| HikariError::Js("no document".into()))?;
        let Some(element) = document.query_selector(selector)? else {
            log::warn!(target: "hikari::effect", "no element matches {selector}");
            return Ok(false);
        };
        let canvas: HtmlCanvasElement = element
            .dyn_into()
            .map_err(|_| HikariError::Canvas(format!("{selector} is not a canvas")))?;

        let gl = WebGl::new(canvas.clone())?;
        {
            let style = window().and_then(|w| w.get_computed_style(&canvas).ok().flatten());
            let lookup = |name: &str| style.as_ref().and_then(|s| s.get_property_value(name).ok());
            self.shared.effect.borrow_mut().resolve_css_vars(&lookup);
        }

        if let Err(err) = self.attach(&canvas) {
            self.detach();
            return Err(err);
        }

        let request = self.shared.effect.borrow_mut().connect(gl, measure(&canvas));
        if request == FrameRequest::Schedule {
            request_frame(&self.shared)?;
        }
        Ok(true)
    }

    /// Resolves CSS custom properties against the canvas style. Returns the
    /// input unchanged when it cannot be resolved.
    pub fn resolve_css(&self, value: &str) -> String {
        let canvas = self.shared.canvas.borrow();
        let style = canvas
            .as_ref()
            .and_then(|c| window().and_then(|w| w.get_computed_style(c).ok().flatten()));
        crate::color::resolve_css(value, |name| {
            style.as_ref().and_then(|s| s.get_property_value(name).ok())
        })
        .unwrap_or_else(|| value.to_owned())
    }

    pub fn play(&self) -> Result<(), JsValue> {
        let request = self.shared.effect.borrow_mut().play();
        if request == FrameRequest::Schedule {
            request_frame(&self.shared)?;
        }
        Ok(())
    }

    pub fn pause(&self) {
        self.shared.effect.borrow_mut().pause();
    }

    pub fn resize(&self) {
        let Some(canvas) = self.shared.canvas.borrow().clone() else {
            return;
        };
        self.shared.effect.borrow_mut().resize(measure(&canvas));
    }

    /// Removes every listener and stops the frame chain.
    pub fn disconnect(&self) {
        self.shared.effect.borrow_mut().disconnect();
        self.detach();
    }

    /// Hooks the canvas into the page. Partial work is undone by `detach`.
    fn attach(&self, canvas: &HtmlCanvasElement) -> Result<(), HikariError> {
        *self.shared.canvas.borrow_mut() = Some(canvas.clone());
        self.install_listeners(canvas)?;
        self.observe(canvas)?;
        mark_loaded(canvas)
    }

    fn detach(&self) {
        self.shared.canvas.borrow_mut().take();
        for listener in self.shared.listeners.borrow_mut().drain(..) {
            if let Err(err) = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            ) {
                log::warn!(target: "hikari::effect", "cannot remove {} listener: {err:?}", listener.kind);
            }
        }
        if let (Some(handle), Some(win)) = (self.shared.scroll_timer.take(), window()) {
            win.clear_timeout_with_handle(handle);
        }
        if let Some(observer) = self.shared.observer.borrow_mut().take() {
            observer.observer.disconnect();
        }
    }

    fn install_listeners(&self, canvas: &HtmlCanvasElement) -> Result<(), HikariError> {
        let win: EventTarget = window()
            .ok_or_else(|| HikariError::Js("no window".into()))?
            .into();

        let weak = Rc::downgrade(&self.shared);
        *self.shared.settle.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.scroll_timer.set(None);
                let request = shared.effect.borrow_mut().scroll_settled();
                if request == FrameRequest::Schedule {
                    if let Err(err) = request_frame(&shared) {
                        log::warn!(target: "hikari::effect", "requestAnimationFrame failed: {err:?}");
                    }
                }
            }
        }) as Box<dyn FnMut()>));

        let weak = Rc::downgrade(&self.shared);
        self.listen(&win, "scroll", move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.effect.borrow_mut().scroll_started();
                restart_settle_timer(&shared);
            }
        })?;

        let weak = Rc::downgrade(&self.shared);
        let target = canvas.clone();
        self.listen(&win, "resize", move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.effect.borrow_mut().resize(measure(&target));
            }
        })?;

        if self.shared.effect.borrow().wants_pointer() {
            let weak = Rc::downgrade(&self.shared);
            let target = canvas.clone();
            self.listen(canvas, "pointermove", move |event| {
                let (Some(shared), Ok(event)) = (weak.upgrade(), event.dyn_into::<MouseEvent>()) else {
                    return;
                };
                let rect = target.get_bounding_client_rect();
                let x = event.client_x() as f64 - rect.left();
                let y = event.client_y() as f64 - rect.top();
                shared.effect.borrow_mut().pointer_moved(
                    x as f32,
                    y as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                );
            })?;
        }
        Ok(())
    }

    fn listen(
        &self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), HikariError> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        self.shared.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }

    fn observe(&self, canvas: &HtmlCanvasElement) -> Result<(), HikariError> {
        let weak = Rc::downgrade(&self.shared);
        let callback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            for entry in entries.iter() {
                if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                    shared
                        .effect
                        .borrow_mut()
                        .set_intersecting(entry.is_intersecting());
                }
            }
        }) as Box<dyn FnMut(js_sys::Array)>);
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
        observer.observe(canvas);
        *self.shared.observer.borrow_mut() = Some(Observer {
            observer,
            _callback: callback,
        });
        Ok(())
    }
}

/// Requests one animation frame. The frame closure is created once and
/// holds only a weak reference back to the runtime.
fn request_frame<E: Effect<WebGl> + 'static>(shared: &Rc<Shared<E>>) -> Result<(), JsValue> {
    if shared.frame.borrow().is_none() {
        let weak: Weak<Shared<E>> = Rc::downgrade(shared);
        *shared.frame.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let request = shared
                .effect
                .borrow_mut()
                .tick(Some(timestamp), document_hidden());
            if request == FrameRequest::Schedule {
                if let Err(err) = request_frame(&shared) {
                    log::warn!(target: "hikari::effect", "requestAnimationFrame failed: {err:?}");
                }
            }
        }) as Box<dyn FnMut(f64)>));
    }
    let frame = shared.frame.borrow();
    let callback = frame.as_ref().ok_or("frame callback missing")?;
    window()
        .ok_or("no window")?
        .request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}

/// Debounces scroll: every event pushes the settle callback out again.
fn restart_settle_timer<E>(shared: &Shared<E>) {
    let Some(win) = window() else {
        return;
    };
    if let Some(handle) = shared.scroll_timer.take() {
        win.clear_timeout_with_handle(handle);
    }
    let settle = shared.settle.borrow();
    let Some(callback) = settle.as_ref() else {
        return;
    };
    match win.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        SCROLL_SETTLE_MS as i32,
    ) {
        Ok(handle) => shared.scroll_timer.set(Some(handle)),
        Err(err) => log::warn!(target: "hikari::effect", "setTimeout failed: {err:?}"),
    }
}

/// Marks the canvas loaded now and its parent after a delay.
fn mark_loaded(canvas: &HtmlCanvasElement) -> Result<(), HikariError> {
    canvas.class_list().add_1(LOADED_CLASS)?;
    let (Some(parent), Some(win)) = (canvas.parent_element(), window()) else {
        return Ok(());
    };
    let mark_parent = Closure::once_into_js(move || {
        if let Err(err) = parent.class_list().add_1(LOADED_CLASS) {
            log::warn!(target: "hikari::effect", "cannot mark parent loaded: {err:?}");
        }
    });
    win.set_timeout_with_callback_and_timeout_and_arguments_0(
        mark_parent.unchecked_ref(),
        PARENT_LOADED_DELAY_MS as i32,
    )?;
    Ok(())
}
