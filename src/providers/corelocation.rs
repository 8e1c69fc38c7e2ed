use super::{LocationProvider, PositionRequest};
use crate::error::PositionError;
use crate::location::Fix;
use chrono::{DateTime, TimeZone, Utc};
use objc::declare::ClassDecl;
use objc::rc::StrongPtr;
use objc::runtime::{Class, Object, Sel};
use objc::{class, msg_send, sel, sel_impl};
use std::ffi::CStr;
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Mutex, OnceLock};
use tokio::sync::oneshot;

const KCL_LOCATION_ACCURACY_BEST: f64 = -1.0;
const KCL_LOCATION_ACCURACY_HUNDRED_METERS: f64 = 100.0;
const KCL_ERROR_LOCATION_UNKNOWN: isize = 0;
const KCL_ERROR_DENIED: isize = 1;
const KCL_AUTHORIZATION_RESTRICTED: i32 = 1;
const KCL_AUTHORIZATION_DENIED: i32 = 2;

struct RawFix {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    timestamp: f64,
}

struct DelegateState {
    tx: Mutex<Option<oneshot::Sender<Result<RawFix, PositionError>>>>,
    // Fixes stamped before this instant (unix seconds) are cached and skipped.
    not_before: f64,
}

impl DelegateState {
    fn new(tx: oneshot::Sender<Result<RawFix, PositionError>>, not_before: f64) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
            not_before,
        }
    }

    fn send(&self, value: Result<RawFix, PositionError>) {
        if let Some(sender) = self.tx.lock().ok().and_then(|mut guard| guard.take()) {
            let _ = sender.send(value);
        }
    }
}

#[repr(C)]
struct CLLocationCoordinate2D {
    latitude: f64,
    longitude: f64,
}

fn delegate_class() -> &'static Class {
    static CLASS: OnceLock<&'static Class> = OnceLock::new();
    CLASS.get_or_init(|| unsafe {
        let superclass = class!(NSObject);
        let mut decl = ClassDecl::new("GeoCheckinCLDelegate", superclass)
            .expect("GeoCheckinCLDelegate declared twice");
        decl.add_ivar::<*mut c_void>("state");
        decl.add_method(
            sel!(locationManager:didUpdateLocations:),
            did_update as extern "C" fn(&mut Object, Sel, *mut Object, *mut Object),
        );
        decl.add_method(
            sel!(locationManager:didFailWithError:),
            did_fail as extern "C" fn(&mut Object, Sel, *mut Object, *mut Object),
        );
        decl.add_method(sel!(dealloc), dealloc as extern "C" fn(&mut Object, Sel));
        decl.register()
    })
}

unsafe fn delegate_state(this: &Object) -> Option<&'static DelegateState> {
    let ptr: *mut c_void = *this.get_ivar("state");
    if ptr.is_null() {
        None
    } else {
        Some(&*(ptr as *mut DelegateState))
    }
}

extern "C" fn did_update(this: &mut Object, _: Sel, manager: *mut Object, locations: *mut Object) {
    unsafe {
        let Some(state) = delegate_state(this) else {
            return;
        };
        let count: usize = msg_send![locations, count];
        if count == 0 {
            return;
        }
        let location: *mut Object = msg_send![locations, lastObject];
        if location.is_null() {
            return;
        }
        let timestamp_obj: *mut Object = msg_send![location, timestamp];
        let timestamp: f64 = msg_send![timestamp_obj, timeIntervalSince1970];
        if timestamp < state.not_before {
            // cached fix delivered on start; wait for a fresh one
            return;
        }
        let coordinate: CLLocationCoordinate2D = msg_send![location, coordinate];
        let accuracy: f64 = msg_send![location, horizontalAccuracy];
        state.send(Ok(RawFix {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            accuracy,
            timestamp,
        }));
        let _: () = msg_send![manager, stopUpdatingLocation];
    }
}

extern "C" fn did_fail(this: &mut Object, _: Sel, manager: *mut Object, error: *mut Object) {
    unsafe {
        let Some(state) = delegate_state(this) else {
            return;
        };
        let code: isize = msg_send![error, code];
        let err = match code {
            // transient; CoreLocation keeps trying
            KCL_ERROR_LOCATION_UNKNOWN => return,
            KCL_ERROR_DENIED => PositionError::Denied,
            _ => {
                let description: *mut Object = msg_send![error, localizedDescription];
                let c_string: *const std::os::raw::c_char = msg_send![description, UTF8String];
                let reason = if c_string.is_null() {
                    "unknown".to_string()
                } else {
                    CStr::from_ptr(c_string).to_string_lossy().into_owned()
                };
                PositionError::Failed(reason)
            }
        };
        state.send(Err(err));
        let _: () = msg_send![manager, stopUpdatingLocation];
    }
}

extern "C" fn dealloc(this: &mut Object, _: Sel) {
    unsafe {
        let ptr: *mut c_void = *this.get_ivar("state");
        if !ptr.is_null() {
            drop(Box::from_raw(ptr as *mut DelegateState));
            this.set_ivar("state", ptr::null_mut::<c_void>());
        }
        if let Some(superclass) = this.class().superclass() {
            let _: () = msg_send![super(this, superclass), dealloc];
        }
    }
}

fn timestamp_from_unix(seconds: f64) -> DateTime<Utc> {
    let whole = seconds.floor();
    let mut nanos = ((seconds - whole) * 1_000_000_000.0) as i64;
    let mut secs = whole as i64;
    if nanos < 0 {
        nanos += 1_000_000_000;
        secs -= 1;
    }
    Utc.timestamp_opt(secs, nanos as u32)
        .single()
        .unwrap_or_else(Utc::now)
}

pub struct CoreLocationProvider;

impl LocationProvider for CoreLocationProvider {
    fn name(&self) -> &'static str {
        "corelocation"
    }

    fn is_available(&self) -> bool {
        unsafe {
            let enabled: bool = msg_send![class!(CLLocationManager), locationServicesEnabled];
            enabled
        }
    }

    async fn request_location(&self, request: &PositionRequest) -> Result<Fix, PositionError> {
        let (tx, rx) = oneshot::channel();
        let not_before = if request.max_cache_age.is_zero() {
            Utc::now().timestamp_millis() as f64 / 1000.0
        } else {
            (Utc::now().timestamp_millis() as f64 - request.max_cache_age.as_millis() as f64)
                / 1000.0
        };
        let desired_accuracy = if request.high_accuracy {
            KCL_LOCATION_ACCURACY_BEST
        } else {
            KCL_LOCATION_ACCURACY_HUNDRED_METERS
        };

        let session = unsafe {
            log::debug!("requesting CoreLocation fix");

            let status: i32 = msg_send![class!(CLLocationManager), authorizationStatus];
            if status == KCL_AUTHORIZATION_DENIED || status == KCL_AUTHORIZATION_RESTRICTED {
                return Err(PositionError::Denied);
            }

            let manager_ptr: *mut Object = msg_send![class!(CLLocationManager), alloc];
            let manager_ptr: *mut Object = msg_send![manager_ptr, init];
            if manager_ptr.is_null() {
                return Err(PositionError::Failed(
                    "failed to create CLLocationManager".into(),
                ));
            }
            let manager = StrongPtr::new(manager_ptr);

            let delegate_ptr: *mut Object = msg_send![delegate_class(), alloc];
            let delegate_ptr: *mut Object = msg_send![delegate_ptr, init];
            if delegate_ptr.is_null() {
                return Err(PositionError::Failed("failed to allocate delegate".into()));
            }
            let state = Box::new(DelegateState::new(tx, not_before));
            (*delegate_ptr).set_ivar("state", Box::into_raw(state) as *mut c_void);
            let delegate = StrongPtr::new(delegate_ptr);

            let _: () = msg_send![*manager, setDelegate: *delegate];
            let _: () = msg_send![*manager, setDesiredAccuracy: desired_accuracy];
            let _: () = msg_send![*manager, requestWhenInUseAuthorization];
            let _: () = msg_send![*manager, startUpdatingLocation];
            (manager, delegate)
        };

        let result = tokio::time::timeout(request.timeout, rx).await;
        let (manager, _delegate) = session;
        unsafe {
            let _: () = msg_send![*manager, stopUpdatingLocation];
        }
        match result {
            Ok(Ok(Ok(raw))) => Ok(Fix::new(
                raw.latitude,
                raw.longitude,
                raw.accuracy,
                timestamp_from_unix(raw.timestamp),
            )),
            Ok(Ok(Err(err))) => Err(err),
            Ok(Err(_closed)) => Err(PositionError::Failed(
                "CoreLocation channel closed".into(),
            )),
            Err(_) => Err(PositionError::Timeout),
        }
    }
}
