//! Certificate-epoch time conversion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::Error;
use crate::record::NULL_CERT_TIME;

// Unix timestamp of 2000-01-01T00:00:00Z, the certificate epoch origin.
const CERT_EPOCH_OFFSET: i64 = 946_684_800;

pub(crate) fn cert_epoch_to_time(epoch: u32) -> Result<NaiveDateTime, Error> {
    DateTime::from_timestamp(CERT_EPOCH_OFFSET + i64::from(epoch), 0)
        .map(|t| t.naive_utc())
        .ok_or(Error::Internal("certificate epoch out of range"))
}

/// The X.509 "no well-defined expiration" time, 9999-12-31T23:59:59Z.
pub(crate) fn no_expiration_time() -> Result<NaiveDateTime, Error> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .ok_or(Error::Internal("no-expiration time out of range"))
}

/// Wall-clock form of a validity bound; the null sentinel maps to the
/// no-expiration time.
pub(crate) fn validity_time(epoch: u32) -> Result<NaiveDateTime, Error> {
    if epoch == NULL_CERT_TIME {
        no_expiration_time()
    } else {
        cert_epoch_to_time(epoch)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use crate::time::{cert_epoch_to_time, validity_time};

    #[rstest(epoch, y, mo, d, h, mi, s,
        case(1, 2000, 1, 1, 0, 0, 1),
        case(686_279_679, 2021, 9, 30, 1, 14, 39),
        case(u32::MAX, 2136, 2, 7, 6, 28, 15),
    )]
    fn test_cert_epoch_to_time(epoch: u32, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) {
        let expected = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        assert_eq!(expected, cert_epoch_to_time(epoch).unwrap());
    }

    #[test]
    fn test_null_time_maps_to_no_expiration() {
        let expected = NaiveDate::from_ymd_opt(9999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(expected, validity_time(0).unwrap());
        assert_ne!(expected, validity_time(1).unwrap());
    }
}
