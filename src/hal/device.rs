//! Device id and clock.

use esp_idf_svc::sys;

use crate::transport::DeviceId;

/// Factory MAC burned into eFuse, used as the instrument serial.
pub struct EfuseMac;

impl DeviceId for EfuseMac {
    fn unique_id(&mut self, buf: &mut [u8]) -> Option<usize> {
        let mut mac = [0u8; 6];
        // SAFETY: esp_efuse_mac_get_default writes exactly 6 bytes
        let err = unsafe { sys::esp_efuse_mac_get_default(mac.as_mut_ptr()) };
        if err != sys::ESP_OK {
            return None;
        }
        let n = mac.len().min(buf.len());
        buf[..n].copy_from_slice(&mac[..n]);
        Some(n)
    }
}

/// Microseconds since boot.
pub fn timestamp_us() -> i64 {
    unsafe { sys::esp_timer_get_time() }
}
