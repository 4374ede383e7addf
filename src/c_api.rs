// C ABI for embedding the trainer. Every call takes and returns UTF-8 C
// strings; results are JSON and must be released with `word_trainer_free_string`.
use crate::config::TrainerConfig;
use crate::core::types::Submission;
use crate::error::{Result, TrainerError};
use crate::logging::init_file_logger;
use crate::persistence::FileStore;
use crate::TrainerEngine;
use libc::c_char;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::RwLock;

static ENGINE: RwLock<Option<TrainerEngine<FileStore>>> = RwLock::new(None);

unsafe fn arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn into_c_string(json: String) -> *mut c_char {
    CString::new(json).unwrap_or_default().into_raw()
}

fn error_json(message: &str, fatal: bool) -> String {
    serde_json::json!({ "error": message, "fatal": fatal }).to_string()
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    match result.and_then(|value| {
        serde_json::to_string(&value).map_err(|e| TrainerError::Config(e.to_string()))
    }) {
        Ok(json) => json,
        Err(e) => {
            log::error!("c_api: {e}");
            error_json(&e.to_string(), e.is_fatal())
        }
    }
}

/// Runs `f` against the live engine, turning panics and a missing engine into
/// error JSON.
fn with_engine<F>(f: F) -> *mut c_char
where
    F: FnOnce(&TrainerEngine<FileStore>) -> String,
{
    let result = catch_unwind(AssertUnwindSafe(|| match ENGINE.read() {
        Ok(guard) => match guard.as_ref() {
            Some(engine) => f(engine),
            None => error_json("engine not initialised", false),
        },
        Err(_) => error_json("engine lock poisoned", true),
    }));
    into_c_string(result.unwrap_or_else(|_| {
        log::error!("c_api: panic inside engine call");
        error_json("internal panic", true)
    }))
}

/// Loads config, corpus and store. `config_path` may be null to use the
/// discovered config. Returns `false` on failure; details go to the log.
#[no_mangle]
pub extern "C" fn word_trainer_init(config_path: *const c_char) -> bool {
    let path = unsafe { arg(config_path) }.map(Path::new);
    let result = catch_unwind(|| {
        let config = match path {
            Some(path) => TrainerConfig::from_file(path)?,
            None => TrainerConfig::discover()?,
        };
        if let Err(e) = init_file_logger(&config.log_path, config.log_filter()) {
            eprintln!("[trainer] file logging unavailable: {e}");
        }
        TrainerEngine::from_config(&config)
    });

    match result {
        Ok(Ok(engine)) => match ENGINE.write() {
            Ok(mut slot) => {
                *slot = Some(engine);
                log::info!("c_api: engine initialised");
                true
            }
            Err(_) => false,
        },
        Ok(Err(e)) => {
            log::error!("c_api: init failed: {e}");
            eprintln!("[trainer] init failed: {e}");
            false
        }
        Err(_) => {
            eprintln!("[trainer] panic during init");
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn word_trainer_destroy() {
    if let Ok(mut slot) = ENGINE.write() {
        if slot.take().is_some() {
            log::info!("c_api: engine released");
            log::logger().flush();
        }
    }
}

#[no_mangle]
pub extern "C" fn word_trainer_next_puzzle(user: *const c_char) -> *mut c_char {
    let Some(user) = (unsafe { arg(user) }) else {
        return into_c_string(error_json("user must be a UTF-8 string", false));
    };
    with_engine(|engine| respond(engine.select_and_build_puzzle(user)))
}

#[no_mangle]
pub extern "C" fn word_trainer_submit(user: *const c_char, submission_json: *const c_char) -> *mut c_char {
    let (Some(user), Some(body)) = (unsafe { arg(user) }, unsafe { arg(submission_json) }) else {
        return into_c_string(error_json("user and submission must be UTF-8 strings", false));
    };
    with_engine(|engine| match serde_json::from_str::<Submission>(body) {
        Ok(submission) => respond(engine.process_submission(user, &submission)),
        Err(e) => error_json(&format!("malformed submission: {e}"), false),
    })
}

#[no_mangle]
pub extern "C" fn word_trainer_user_summary(user: *const c_char) -> *mut c_char {
    let Some(user) = (unsafe { arg(user) }) else {
        return into_c_string(error_json("user must be a UTF-8 string", false));
    };
    with_engine(|engine| respond(engine.user_summary(user)))
}

#[no_mangle]
pub extern "C" fn word_trainer_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}
