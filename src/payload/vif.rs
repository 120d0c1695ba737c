//! VIF/VIFE lookups
//!
//! Maps Value Information Fields to unit, decimal multiplier and quantity as
//! defined in EN 13757-3. Primary VIFs carry `vif` in 0x00–0x7F, codes from
//! the 0xFD extension table are reported as `0x100 + code` and codes from the
//! 0xFB table as `0x200 + code`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VifInfo {
    pub vif: u16,
    pub unit: &'static str,
    pub exponent: f64,
    pub quantity: &'static str,
}

const TIME_UNITS: [&str; 4] = ["s", "min", "h", "d"];

fn info(vif: u16, unit: &'static str, power: i32, quantity: &'static str) -> VifInfo {
    VifInfo {
        vif,
        unit,
        exponent: 10f64.powi(power),
        quantity,
    }
}

/// Looks up a primary VIF. The extension bit is ignored.
///
/// Returns `None` for reserved codes and for the 0x7B/0x7D table selectors,
/// which are only meaningful with the extension bit set (0xFB/0xFD).
pub fn lookup_primary_vif(vif: u8) -> Option<VifInfo> {
    let code = vif & 0x7F;
    let v = code as u16;
    let n3 = (code & 0x07) as i32;
    let n2 = (code & 0x03) as i32;

    let info = match code {
        0x00..=0x07 => info(v, "Wh", n3 - 3, "Energy"),
        0x08..=0x0F => info(v, "J", n3, "Energy"),
        0x10..=0x17 => info(v, "m^3", n3 - 6, "Volume"),
        0x18..=0x1F => info(v, "kg", n3 - 3, "Mass"),
        0x20..=0x23 => info(v, TIME_UNITS[n2 as usize], 0, "On time"),
        0x24..=0x27 => info(v, TIME_UNITS[n2 as usize], 0, "Operating time"),
        0x28..=0x2F => info(v, "W", n3 - 3, "Power"),
        0x30..=0x37 => info(v, "J/h", n3, "Power"),
        0x38..=0x3F => info(v, "m^3/h", n3 - 6, "Volume flow"),
        0x40..=0x47 => info(v, "m^3/min", n3 - 7, "Volume flow"),
        0x48..=0x4F => info(v, "m^3/s", n3 - 9, "Volume flow"),
        0x50..=0x57 => info(v, "kg/h", n3 - 3, "Mass flow"),
        0x58..=0x5B => info(v, "°C", n2 - 3, "Flow temperature"),
        0x5C..=0x5F => info(v, "°C", n2 - 3, "Return temperature"),
        0x60..=0x63 => info(v, "K", n2 - 3, "Temperature difference"),
        0x64..=0x67 => info(v, "°C", n2 - 3, "External temperature"),
        0x68..=0x6B => info(v, "bar", n2 - 3, "Pressure"),
        0x6C => info(v, "-", 0, "Time point (date)"),
        0x6D => info(v, "-", 0, "Time point (date & time)"),
        0x6E => info(v, "Units for H.C.A.", 0, "H.C.A."),
        0x70..=0x73 => info(v, TIME_UNITS[n2 as usize], 0, "Averaging duration"),
        0x74..=0x77 => info(v, TIME_UNITS[n2 as usize], 0, "Actuality duration"),
        0x78 => info(v, "", 0, "Fabrication No"),
        0x79 => info(v, "", 0, "(Enhanced) Identification"),
        0x7A => info(v, "", 0, "Bus Address"),
        0x7C => info(v, "", 0, "Plain text"),
        0x7E => info(v, "", 0, "Any VIF"),
        0x7F => info(v, "", 0, "Manufacturer specific"),
        _ => return None,
    };
    Some(info)
}

/// Looks up a code from the first extension table (VIF 0xFD).
pub fn lookup_vife_fd(code: u8) -> Option<VifInfo> {
    let code = code & 0x7F;
    let v = 0x100 + code as u16;
    let n2 = (code & 0x03) as i32;
    let n4 = (code & 0x0F) as i32;

    let info = match code {
        0x00..=0x03 => info(v, "Currency units", n2 - 3, "Credit"),
        0x04..=0x07 => info(v, "Currency units", n2 - 3, "Debit"),
        0x08 => info(v, "", 0, "Access Number (transmission count)"),
        0x09 => info(v, "", 0, "Medium"),
        0x0A => info(v, "", 0, "Manufacturer"),
        0x0B => info(v, "", 0, "Parameter set identification"),
        0x0C => info(v, "", 0, "Model / Version"),
        0x0D => info(v, "", 0, "Hardware version"),
        0x0E => info(v, "", 0, "Firmware version"),
        0x0F => info(v, "", 0, "Software version"),
        0x10 => info(v, "", 0, "Customer location"),
        0x11 => info(v, "", 0, "Customer"),
        0x12 => info(v, "", 0, "Access Code User"),
        0x13 => info(v, "", 0, "Access Code Operator"),
        0x14 => info(v, "", 0, "Access Code System Operator"),
        0x15 => info(v, "", 0, "Access Code Developer"),
        0x16 => info(v, "", 0, "Password"),
        0x17 => info(v, "", 0, "Error flags"),
        0x18 => info(v, "", 0, "Error mask"),
        0x1A => info(v, "", 0, "Digital output"),
        0x1B => info(v, "", 0, "Digital input"),
        0x1C => info(v, "Baud", 0, "Baudrate"),
        0x1D => info(v, "Bittimes", 0, "Response delay time"),
        0x1E => info(v, "", 0, "Retry"),
        0x20 => info(v, "", 0, "First storage # for cyclic storage"),
        0x21 => info(v, "", 0, "Last storage # for cyclic storage"),
        0x22 => info(v, "", 0, "Size of storage block"),
        0x24..=0x27 => info(v, TIME_UNITS[n2 as usize], 0, "Storage interval"),
        0x28 => info(v, "month(s)", 0, "Storage interval"),
        0x29 => info(v, "year(s)", 0, "Storage interval"),
        0x2C..=0x2F => info(v, TIME_UNITS[n2 as usize], 0, "Duration since last readout"),
        0x40..=0x4F => info(v, "V", n4 - 9, "Voltage"),
        0x50..=0x5F => info(v, "A", n4 - 12, "Current"),
        0x60 => info(v, "", 0, "Reset counter"),
        0x61 => info(v, "", 0, "Cumulation counter"),
        0x62 => info(v, "", 0, "Control signal"),
        0x63 => info(v, "", 0, "Day of week"),
        0x64 => info(v, "", 0, "Week number"),
        0x65 => info(v, "", 0, "Time point of day change"),
        0x66 => info(v, "", 0, "State of parameter activation"),
        0x67 => info(v, "", 0, "Special supplier information"),
        0x68..=0x6B => info(v, TIME_UNITS[n2 as usize], 0, "Duration since last cumulation"),
        0x6C..=0x6F => info(v, TIME_UNITS[n2 as usize], 0, "Operating time battery"),
        0x70 => info(v, "-", 0, "Date and time of battery change"),
        0x74 => info(v, "d", 0, "Remaining battery life"),
        _ => return None,
    };
    Some(info)
}

/// Looks up a code from the second extension table (VIF 0xFB).
pub fn lookup_vife_fb(code: u8) -> Option<VifInfo> {
    let code = code & 0x7F;
    let v = 0x200 + code as u16;
    let n1 = (code & 0x01) as i32;
    let n2 = (code & 0x03) as i32;

    let info = match code {
        0x00..=0x01 => info(v, "MWh", n1 - 1, "Energy"),
        0x08..=0x09 => info(v, "GJ", n1 - 1, "Energy"),
        0x10..=0x11 => info(v, "m^3", n1 + 2, "Volume"),
        0x18..=0x19 => info(v, "t", n1 + 2, "Mass"),
        0x21 => info(v, "feet^3", -1, "Volume"),
        0x22 => info(v, "american gallon", -1, "Volume"),
        0x23 => info(v, "american gallon", 0, "Volume"),
        0x24 => info(v, "american gallon/min", -3, "Volume flow"),
        0x25 => info(v, "american gallon/min", 0, "Volume flow"),
        0x26 => info(v, "american gallon/h", 0, "Volume flow"),
        0x28..=0x29 => info(v, "MW", n1 - 1, "Power"),
        0x30..=0x31 => info(v, "GJ/h", n1 - 1, "Power"),
        0x58..=0x5B => info(v, "°F", n2 - 3, "Flow temperature"),
        0x5C..=0x5F => info(v, "°F", n2 - 3, "Return temperature"),
        0x60..=0x63 => info(v, "°F", n2 - 3, "Temperature difference"),
        0x64..=0x67 => info(v, "°F", n2 - 3, "External temperature"),
        0x70..=0x73 => info(v, "°F", n2 - 3, "Cold / Warm Temperature Limit"),
        0x74..=0x77 => info(v, "°C", n2 - 3, "Cold / Warm Temperature Limit"),
        _ => return None,
    };
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_scaling() {
        let wh = lookup_primary_vif(0x03).unwrap();
        assert_eq!(wh.unit, "Wh");
        assert_eq!(wh.exponent, 1.0);
        assert_eq!(wh.quantity, "Energy");

        let mwh = lookup_primary_vif(0x06).unwrap();
        assert_eq!(mwh.exponent, 1000.0);
    }

    #[test]
    fn test_extension_bit_is_ignored() {
        assert_eq!(lookup_primary_vif(0x93), lookup_primary_vif(0x13));
    }

    #[test]
    fn test_temperatures() {
        let flow = lookup_primary_vif(0x5B).unwrap();
        assert_eq!(flow.quantity, "Flow temperature");
        assert_eq!(flow.exponent, 1.0);
        let ret = lookup_primary_vif(0x5E).unwrap();
        assert_eq!(ret.quantity, "Return temperature");
        assert!((ret.exponent - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_reserved_primary_codes() {
        assert!(lookup_primary_vif(0x6F).is_none());
        assert!(lookup_primary_vif(0x7B).is_none());
        assert!(lookup_primary_vif(0x7D).is_none());
    }

    #[test]
    fn test_fd_table() {
        let access = lookup_vife_fd(0x08).unwrap();
        assert_eq!(access.vif, 0x108);
        assert!(lookup_vife_fd(0x48).unwrap().quantity == "Voltage");
        assert!(lookup_vife_fd(0x7F).is_none());
    }

    #[test]
    fn test_fb_table() {
        let mwh = lookup_vife_fb(0x01).unwrap();
        assert_eq!(mwh.vif, 0x201);
        assert_eq!(mwh.unit, "MWh");
        assert!(lookup_vife_fb(0x40).is_none());
    }
}
