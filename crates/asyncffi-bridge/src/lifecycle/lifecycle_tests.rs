#![allow(non_snake_case)]

use super::*;
use std::ffi::{c_char, c_void};
use std::sync::atomic::AtomicUsize;
use test_case::test_case;

// One slot per test so parallel tests count only their own native calls
const SLOTS: usize = 16;
static INIT_CALLS: [AtomicUsize; SLOTS] = [const { AtomicUsize::new(0) }; SLOTS];
static CLEANUP_CALLS: [AtomicUsize; SLOTS] = [const { AtomicUsize::new(0) }; SLOTS];
static CONFIG_SEEN: std::sync::Mutex<Option<Vec<u8>>> = std::sync::Mutex::new(None);

unsafe extern "C" fn init_ok<const SLOT: usize>() -> bool {
    INIT_CALLS[SLOT].fetch_add(1, Ordering::SeqCst);
    true
}

unsafe extern "C" fn init_fails<const SLOT: usize>() -> bool {
    INIT_CALLS[SLOT].fetch_add(1, Ordering::SeqCst);
    false
}

unsafe extern "C" fn init_with_config_recording(json: *const u8, len: usize) -> bool {
    let bytes = unsafe { std::slice::from_raw_parts(json, len) }.to_vec();
    *CONFIG_SEEN.lock().unwrap() = Some(bytes);
    true
}

unsafe extern "C" fn cleanup_counting<const SLOT: usize>() {
    CLEANUP_CALLS[SLOT].fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn never_accepts(
    _who: *const c_char,
    _samples: usize,
    _callback: Option<crate::native::ResultCallback>,
    _token: *mut c_void,
) -> bool {
    false
}

unsafe extern "C" fn never_accepts_pair(
    _who: *const c_char,
    _samples: usize,
    _callback: Option<crate::native::ResultOrErrorCallback>,
    _token: *mut c_void,
) -> bool {
    false
}

unsafe extern "C" fn free_nothing(_ptr: *mut c_char) {}

fn mock_api<const SLOT: usize>(init: crate::native::InitFn) -> NativeApi {
    NativeApi {
        init,
        init_with_config: None,
        cleanup: cleanup_counting::<SLOT>,
        say_hello: never_accepts,
        say_hello_with_error: never_accepts_pair,
        free_string: free_nothing,
    }
}

fn calls(counter: &[AtomicUsize; SLOTS], slot: usize) -> usize {
    counter[slot].load(Ordering::SeqCst)
}

#[test]
fn RuntimeLifecycle___new___starts_uninitialized() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<0>(init_ok::<0>));

    assert_eq!(lifecycle.state(), RuntimeState::Uninitialized);
    assert_eq!(lifecycle.ensure_active(), Err(BridgeError::RuntimeNotInitialized));
}

#[test]
fn RuntimeLifecycle___initialize_twice___native_init_called_once() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<1>(init_ok::<1>));

    assert_eq!(lifecycle.initialize(), Ok(()));
    assert_eq!(lifecycle.initialize(), Ok(()));

    assert_eq!(lifecycle.state(), RuntimeState::Active);
    assert_eq!(lifecycle.ensure_active(), Ok(()));
    assert_eq!(calls(&INIT_CALLS, 1), 1);
}

#[test]
fn RuntimeLifecycle___concurrent_initialize___native_init_called_once() {
    let lifecycle = Arc::new(RuntimeLifecycle::new(mock_api::<2>(init_ok::<2>)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            std::thread::spawn(move || lifecycle.initialize())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }
    assert_eq!(calls(&INIT_CALLS, 2), 1);
}

#[test]
fn RuntimeLifecycle___native_init_fails___failure_is_sticky() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<3>(init_fails::<3>));

    assert!(matches!(lifecycle.initialize(), Err(BridgeError::RuntimeInitError(_))));
    assert!(matches!(lifecycle.initialize(), Err(BridgeError::RuntimeInitError(_))));
    assert!(matches!(lifecycle.ensure_active(), Err(BridgeError::RuntimeInitError(_))));

    assert_eq!(lifecycle.state(), RuntimeState::Failed);
    assert_eq!(calls(&INIT_CALLS, 3), 1);
}

#[test]
fn RuntimeLifecycle___shutdown_before_initialize___invalid_transition() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<4>(init_ok::<4>));

    let result = lifecycle.shutdown();

    assert_eq!(
        result,
        Err(BridgeError::InvalidLifecycleTransition {
            from: "Uninitialized".to_string(),
            to: "ShuttingDown".to_string(),
        })
    );
    assert_eq!(calls(&CLEANUP_CALLS, 4), 0);
}

#[test]
fn RuntimeLifecycle___shutdown_twice___cleanup_called_once() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<5>(init_ok::<5>));
    lifecycle.initialize().unwrap();

    assert_eq!(lifecycle.shutdown(), Ok(()));
    assert_eq!(lifecycle.shutdown(), Ok(()));

    assert_eq!(lifecycle.state(), RuntimeState::ShutDown);
    assert_eq!(calls(&CLEANUP_CALLS, 5), 1);
}

#[test]
fn RuntimeLifecycle___initialize_after_shutdown___invalid_transition() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<6>(init_ok::<6>));
    lifecycle.initialize().unwrap();
    lifecycle.shutdown().unwrap();

    let result = lifecycle.initialize();

    assert!(matches!(
        result,
        Err(BridgeError::InvalidLifecycleTransition { .. })
    ));
    assert_eq!(lifecycle.ensure_active(), Err(BridgeError::RuntimeShutdownError));
    assert_eq!(calls(&INIT_CALLS, 6), 1);
}

#[test]
fn RuntimeLifecycle___shutdown_after_failed_init___invalid_transition() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<7>(init_fails::<7>));
    let _ = lifecycle.initialize();

    assert!(matches!(
        lifecycle.shutdown(),
        Err(BridgeError::InvalidLifecycleTransition { .. })
    ));
    assert_eq!(calls(&CLEANUP_CALLS, 7), 0);
}

#[test]
fn RuntimeLifecycle___with_config___passes_json_to_native() {
    let mut api = mock_api::<8>(init_ok::<8>);
    api.init_with_config = Some(init_with_config_recording);
    let config = RuntimeConfig::default().with_worker_threads(3);
    let lifecycle = RuntimeLifecycle::new(api).with_config(config.clone());

    lifecycle.initialize().unwrap();

    let seen = CONFIG_SEEN.lock().unwrap().clone().unwrap();
    assert_eq!(RuntimeConfig::from_json(&seen).unwrap(), config);
    assert_eq!(calls(&INIT_CALLS, 8), 0);
}

#[test]
fn RuntimeLifecycle___config_without_native_support___fails_to_start() {
    let lifecycle =
        RuntimeLifecycle::new(mock_api::<9>(init_ok::<9>)).with_config(RuntimeConfig::default());

    assert!(matches!(lifecycle.initialize(), Err(BridgeError::ConfigError(_))));
    assert_eq!(lifecycle.state(), RuntimeState::Failed);
    assert!(matches!(lifecycle.ensure_active(), Err(BridgeError::RuntimeInitError(_))));
}

#[test]
fn RuntimeLifecycle___ids___one_per_native_library() {
    let a = RuntimeLifecycle::new(mock_api::<10>(init_ok::<10>));
    let b = RuntimeLifecycle::new(mock_api::<10>(init_ok::<10>));
    let other = RuntimeLifecycle::new(mock_api::<11>(init_ok::<11>));

    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), other.id());
}

#[test]
fn RuntimeLifecycle___same_library___shutdown_is_seen_by_every_handle() {
    let first = RuntimeLifecycle::new(mock_api::<12>(init_ok::<12>));
    let second = RuntimeLifecycle::new(mock_api::<12>(init_ok::<12>));
    first.initialize().unwrap();

    assert_eq!(second.state(), RuntimeState::Active);
    assert_eq!(second.initialize(), Ok(()));

    second.shutdown().unwrap();

    assert_eq!(first.state(), RuntimeState::ShutDown);
    assert_eq!(first.ensure_active(), Err(BridgeError::RuntimeShutdownError));
    assert_eq!(first.shutdown(), Ok(()));
    let late = RuntimeLifecycle::new(mock_api::<12>(init_ok::<12>));
    assert!(matches!(
        late.initialize(),
        Err(BridgeError::InvalidLifecycleTransition { .. })
    ));
    assert_eq!(calls(&INIT_CALLS, 12), 1);
    assert_eq!(calls(&CLEANUP_CALLS, 12), 1);
}

#[test]
fn RuntimeLifecycle___while_active___runs_only_when_active() {
    let lifecycle = RuntimeLifecycle::new(mock_api::<13>(init_ok::<13>));

    assert_eq!(
        lifecycle.while_active(|| 1),
        Err(BridgeError::RuntimeNotInitialized)
    );
    lifecycle.initialize().unwrap();
    assert_eq!(lifecycle.while_active(|| 2), Ok(2));
    lifecycle.shutdown().unwrap();
    assert_eq!(
        lifecycle.while_active(|| 3),
        Err(BridgeError::RuntimeShutdownError)
    );
}

#[test]
fn RuntimeLifecycle___shutdown___waits_for_while_active_to_return() {
    let lifecycle = Arc::new(RuntimeLifecycle::new(mock_api::<14>(init_ok::<14>)));
    lifecycle.initialize().unwrap();
    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

    let caller = {
        let lifecycle = lifecycle.clone();
        std::thread::spawn(move || {
            lifecycle.while_active(|| {
                entered_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                calls(&CLEANUP_CALLS, 14)
            })
        })
    };
    entered_rx.recv().unwrap();

    let stopper = {
        let lifecycle = lifecycle.clone();
        std::thread::spawn(move || lifecycle.shutdown())
    };
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert!(!stopper.is_finished());
    release_tx.send(()).unwrap();

    assert_eq!(caller.join().unwrap(), Ok(0));
    assert_eq!(stopper.join().unwrap(), Ok(()));
    assert_eq!(calls(&CLEANUP_CALLS, 14), 1);
}

#[test_case(RuntimeState::Uninitialized, RuntimeState::Initializing, true ; "start")]
#[test_case(RuntimeState::Active, RuntimeState::ShuttingDown, true ; "stop")]
#[test_case(RuntimeState::ShutDown, RuntimeState::Initializing, false ; "restart")]
#[test_case(RuntimeState::Failed, RuntimeState::ShuttingDown, false ; "stop after failure")]
#[test_case(RuntimeState::Uninitialized, RuntimeState::Active, false ; "skip initializing")]
fn transition___table___matches_state_machine(from: RuntimeState, to: RuntimeState, ok: bool) {
    let mut state = from;

    let result = transition(&mut state, to);

    assert_eq!(result.is_ok(), ok);
    assert_eq!(state, if ok { to } else { from });
}
