//! Closed table of documented device error codes.
//!
//! Cameras report failures with negative `rspCode` values. The table below
//! carries every code the protocol documentation lists, grouped by
//! functional area. Codes absent from the table still classify fine; they
//! just fall back to a generic description. The numbering has gaps where the
//! vendor never assigned a code.

use std::fmt;

/// Functional group of a device error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Protocol, parameter, session and permission failures.
    General,
    /// Firmware upgrade pipeline.
    Upgrade,
    /// Recording, playback and storage.
    Recording,
    /// Digest authentication handshake.
    DigestAuth,
    /// FTP upload configuration and tests.
    Ftp,
    /// Email notification configuration and tests.
    Email,
    /// Repeated-login lockout.
    Lockout,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::General => "general",
            Category::Upgrade => "upgrade",
            Category::Recording => "recording",
            Category::DigestAuth => "digest auth",
            Category::Ftp => "ftp",
            Category::Email => "email",
            Category::Lockout => "lockout",
        };
        f.write_str(name)
    }
}

/// Description and category for a documented device code, `None` for codes
/// the table does not carry.
pub fn lookup(code: i32) -> Option<(&'static str, Category)> {
    use Category::*;

    let entry = match code {
        -1 => ("missing parameters", General),
        -2 => ("out of memory", General),
        -3 => ("check error", General),
        -4 => ("parameters error", General),
        -5 => ("reached the maximum session count", General),
        -6 => ("please login first", General),
        -7 => ("login failed", General),
        -8 => ("operation timeout", General),
        -9 => ("not supported", General),
        -10 => ("protocol error", General),
        -11 => ("failed to read operation", General),
        -12 => ("failed to get configuration", General),
        -13 => ("failed to set configuration", General),
        -14 => ("failed to apply to device", General),
        -15 => ("ability error", General),
        -16 => ("invalid user", General),
        -17 => ("user already exists", General),
        -18 => ("reached the maximum user count", General),
        -19 => ("firmware version is identical", Upgrade),
        -20 => ("device busy upgrading", Upgrade),
        -21 => ("ipc upgrade failed", Upgrade),
        -22 => ("offline upgrade in progress", Upgrade),
        -23 => ("online upgrade in progress", Upgrade),
        -24 => ("failed to fetch upgrade file", Upgrade),
        -25 => ("upgrade check failed", Upgrade),
        -26 => ("email binding required", Email),
        -27 => ("email not configured", Email),
        -28 => ("media port error", General),
        -29 => ("server connection failed", General),
        -30 => ("upload file type mismatch", Upgrade),
        -31 => ("upgrade package does not match the device", Upgrade),
        -32 => ("file upload incomplete", Upgrade),
        -34 => ("login attempts too frequent", Lockout),
        -35 => ("account locked, try again later", Lockout),
        -36 => ("too many failed logins, account temporarily disabled", Lockout),
        -37 => ("snapshot failed", Recording),
        -38 => ("email test failed", Email),
        -39 => ("ftp test failed", Ftp),
        -40 => ("token expired", General),
        -41 => ("invalid token", General),
        -42 => ("insufficient permission", General),
        -43 => ("operation not allowed on this channel", General),
        -44 => ("channel does not exist", General),
        -45 => ("encoder profile not supported", Recording),
        -46 => ("resolution not supported", Recording),
        -47 => ("bitrate out of range", Recording),
        -48 => ("frame rate out of range", Recording),
        -49 => ("stream type error", Recording),
        -50 => ("recording schedule invalid", Recording),
        -51 => ("no storage device", Recording),
        -52 => ("storage device full", Recording),
        -53 => ("storage device not formatted", Recording),
        -54 => ("storage device formatting", Recording),
        -55 => ("storage device read only", Recording),
        -56 => ("recording in progress", Recording),
        -57 => ("playback seek out of range", Recording),
        -58 => ("search produced no results", Recording),
        -59 => ("download task limit reached", Recording),
        -60 => ("digest nonce expired", DigestAuth),
        -61 => ("digest nonce invalid", DigestAuth),
        -62 => ("digest response mismatch", DigestAuth),
        -63 => ("digest realm mismatch", DigestAuth),
        -64 => ("digest counter replayed", DigestAuth),
        -65 => ("digest algorithm not supported", DigestAuth),
        -66 => ("digest required by device policy", DigestAuth),
        -67 => ("digest credentials malformed", DigestAuth),
        -70 => ("ftp server unreachable", Ftp),
        -71 => ("ftp authentication failed", Ftp),
        -72 => ("ftp directory not found", Ftp),
        -73 => ("ftp directory not writable", Ftp),
        -74 => ("ftp upload interrupted", Ftp),
        -75 => ("ftp passive mode failed", Ftp),
        -76 => ("ftp tls negotiation failed", Ftp),
        -77 => ("ftp file size limit exceeded", Ftp),
        -78 => ("ftp transfer timed out", Ftp),
        -79 => ("ftp configuration incomplete", Ftp),
        -80 => ("smtp server unreachable", Email),
        -81 => ("smtp authentication failed", Email),
        -82 => ("smtp tls negotiation failed", Email),
        -83 => ("email recipient rejected", Email),
        -84 => ("email sender rejected", Email),
        -85 => ("email attachment too large", Email),
        -86 => ("email send timed out", Email),
        -87 => ("email configuration incomplete", Email),
        -88 => ("upgrade package signature invalid", Upgrade),
        -89 => ("upgrade package corrupted", Upgrade),
        -90 => ("battery too low to upgrade", Upgrade),
        -91 => ("upgrade rollback failed", Upgrade),
        -92 => ("locked by administrator", Lockout),
        -93 => ("guest login disabled", Lockout),
        -94 => ("device rebooting", General),
        -95 => ("device busy", General),
        -96 => ("resource temporarily unavailable", General),
        -97 => ("configuration locked by another session", General),
        -98 => ("operation aborted by device", General),
        -99 => ("internal device error", General),
        -100 => ("test operation already running", General),
        -101 => ("certificate import failed", General),
        -102 => ("certificate verification failed", General),
        -103 => ("network interface busy", General),
        -105 => ("parameter out of valid range", General),
        _ => return None,
    };
    Some(entry)
}

/// Description for a device code, with a fallback for codes the table does
/// not document.
pub fn describe(code: i32) -> String {
    match lookup(code) {
        Some((description, _)) => description.to_string(),
        None => format!("unknown error code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_codes_are_documented() {
        assert_eq!(lookup(-6), Some(("please login first", Category::General)));
        assert_eq!(lookup(-7), Some(("login failed", Category::General)));
        assert_eq!(lookup(-5), Some(("reached the maximum session count", Category::General)));
    }

    #[test]
    fn every_category_has_entries() {
        assert_eq!(lookup(-10).unwrap().1, Category::General);
        assert_eq!(lookup(-20).unwrap().1, Category::Upgrade);
        assert_eq!(lookup(-52).unwrap().1, Category::Recording);
        assert_eq!(lookup(-62).unwrap().1, Category::DigestAuth);
        assert_eq!(lookup(-71).unwrap().1, Category::Ftp);
        assert_eq!(lookup(-81).unwrap().1, Category::Email);
        assert_eq!(lookup(-35).unwrap().1, Category::Lockout);
    }

    #[test]
    fn unassigned_numbers_are_absent() {
        assert!(lookup(-33).is_none());
        assert!(lookup(-68).is_none());
        assert!(lookup(-104).is_none());
        assert!(lookup(0).is_none());
        assert!(lookup(200).is_none());
    }

    #[test]
    fn describe_falls_back_for_unknown_codes() {
        assert_eq!(describe(-9), "not supported");
        assert_eq!(describe(-999), "unknown error code -999");
    }

    #[test]
    fn categories_render_lowercase() {
        assert_eq!(Category::DigestAuth.to_string(), "digest auth");
        assert_eq!(Category::Ftp.to_string(), "ftp");
    }
}
