//! Browser tests, run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use parle_frontend_rs::Parle;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const CATALOG: &str = r#"[{
    "id": "lesson-1",
    "level": "A1",
    "category": "Greetings",
    "difficulty": 1,
    "durationMinutes": 10,
    "phrases": [{ "id": "p1", "referenceText": "Bonjour" }]
}]"#;

#[wasm_bindgen_test]
fn grading_persists_a_snapshot() {
    let persisted = js_sys::Array::new();
    let sink = js_sys::Function::new_with_args("snapshot", "this.push(snapshot)")
        .bind(&persisted);

    let parle = Parle::new(CATALOG, None, None, Some(sink)).unwrap();
    let outcome = parle.grade_typed("p1", "bonjour").unwrap();

    assert!(outcome.result.passed);
    assert_eq!(persisted.length(), 1);
    let snapshot = persisted.get(0).as_string().unwrap();
    assert!(snapshot.contains("\"masteredPhraseIds\":[\"p1\"]"));
}

#[wasm_bindgen_test]
fn listeners_are_called_after_changes() {
    let calls = js_sys::Array::new();
    let listener = js_sys::Function::new_with_args("", "this.push(1)").bind(&calls);

    let parle = Parle::new(CATALOG, None, None, None).unwrap();
    parle.subscribe(listener);
    parle.complete_lesson("lesson-1", 80).unwrap();

    assert_eq!(calls.length(), 1);
}

#[wasm_bindgen_test]
fn persist_callback_can_read_progress() {
    let parle_handle: Rc<RefCell<Option<Rc<Parle>>>> = Rc::default();
    let mastered = Rc::new(Cell::new(0));

    let callback = {
        let parle_handle = parle_handle.clone();
        let mastered = mastered.clone();
        Closure::<dyn Fn(String)>::new(move |_snapshot: String| {
            if let Some(parle) = parle_handle.borrow().as_ref() {
                mastered.set(parle.progress().mastered_phrase_ids.len());
            }
        })
    };
    let persist = callback.as_ref().unchecked_ref::<js_sys::Function>().clone();
    callback.forget();

    let parle = Rc::new(Parle::new(CATALOG, None, None, Some(persist)).unwrap());
    *parle_handle.borrow_mut() = Some(parle.clone());

    parle.grade_typed("p1", "bonjour").unwrap();
    assert_eq!(mastered.get(), 1);
}
