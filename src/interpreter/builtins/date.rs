use super::*;
use chrono::{Local, TimeZone, Utc};

const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

fn day(t: f64) -> f64 {
    (t / MS_PER_DAY).floor()
}

fn time_within_day(t: f64) -> f64 {
    t.rem_euclid(MS_PER_DAY)
}

fn days_in_year(y: f64) -> f64 {
    if y % 4.0 != 0.0 {
        365.0
    } else if y % 100.0 != 0.0 {
        366.0
    } else if y % 400.0 != 0.0 {
        365.0
    } else {
        366.0
    }
}

fn day_from_year(y: f64) -> f64 {
    365.0 * (y - 1970.0) + ((y - 1969.0) / 4.0).floor() - ((y - 1901.0) / 100.0).floor()
        + ((y - 1601.0) / 400.0).floor()
}

fn time_from_year(y: f64) -> f64 {
    day_from_year(y) * MS_PER_DAY
}

fn year_from_time(t: f64) -> f64 {
    if !t.is_finite() {
        return f64::NAN;
    }
    let mut lo = (t / MS_PER_DAY / 366.0 + 1970.0).floor() - 1.0;
    let mut hi = (t / MS_PER_DAY / 365.0 + 1970.0).ceil() + 1.0;
    while lo < hi {
        let mid = (lo + (hi - lo) / 2.0).floor();
        if time_from_year(mid) <= t {
            lo = mid + 1.0;
        } else {
            hi = mid;
        }
    }
    lo - 1.0
}

fn in_leap_year(t: f64) -> bool {
    days_in_year(year_from_time(t)) == 366.0
}

fn day_within_year(t: f64) -> f64 {
    day(t) - day_from_year(year_from_time(t))
}

const MONTH_STARTS: [f64; 12] = [0.0, 31.0, 59.0, 90.0, 120.0, 151.0, 181.0, 212.0, 243.0, 273.0, 304.0, 334.0];

fn month_start(m: usize, leap: f64) -> f64 {
    MONTH_STARTS[m] + if m >= 2 { leap } else { 0.0 }
}

fn month_from_time(t: f64) -> f64 {
    let d = day_within_year(t);
    let leap = f64::from(u8::from(in_leap_year(t)));
    (1..12).rev().find(|&m| d >= month_start(m, leap)).unwrap_or(0) as f64
}

fn date_from_time(t: f64) -> f64 {
    let leap = f64::from(u8::from(in_leap_year(t)));
    day_within_year(t) - month_start(month_from_time(t) as usize, leap) + 1.0
}

fn week_day(t: f64) -> f64 {
    (day(t) + 4.0).rem_euclid(7.0)
}

fn hour_from_time(t: f64) -> f64 {
    (time_within_day(t) / 3_600_000.0).floor()
}

fn min_from_time(t: f64) -> f64 {
    (time_within_day(t) / MS_PER_MINUTE).floor().rem_euclid(60.0)
}

fn sec_from_time(t: f64) -> f64 {
    (time_within_day(t) / 1000.0).floor().rem_euclid(60.0)
}

fn ms_from_time(t: f64) -> f64 {
    time_within_day(t).rem_euclid(1000.0)
}

fn make_time(hour: f64, min: f64, sec: f64, ms: f64) -> f64 {
    if !(hour.is_finite() && min.is_finite() && sec.is_finite() && ms.is_finite()) {
        return f64::NAN;
    }
    hour.trunc() * 3_600_000.0 + min.trunc() * MS_PER_MINUTE + sec.trunc() * 1000.0 + ms.trunc()
}

fn make_day(year: f64, month: f64, date: f64) -> f64 {
    if !(year.is_finite() && month.is_finite() && date.is_finite()) {
        return f64::NAN;
    }
    let (y, m) = (year.trunc(), month.trunc());
    let ym = y + (m / 12.0).floor();
    let mn = m.rem_euclid(12.0) as usize;
    let leap = if days_in_year(ym) == 366.0 { 1.0 } else { 0.0 };
    day_from_year(ym) + month_start(mn, leap) + date.trunc() - 1.0
}

fn make_date(day: f64, time: f64) -> f64 {
    if !day.is_finite() || !time.is_finite() {
        return f64::NAN;
    }
    day * MS_PER_DAY + time
}

fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || time.abs() > 8.64e15 {
        return f64::NAN;
    }
    // normalizes -0 to +0
    time.trunc() + 0.0
}

/// Offset of local time from UTC at the instant `t`, in milliseconds.
fn local_offset(t: f64) -> f64 {
    let at = if t.is_finite() {
        Local.timestamp_millis_opt(t as i64).earliest()
    } else {
        None
    };
    let seconds = match at {
        Some(dt) => dt.offset().local_minus_utc(),
        None => Local::now().offset().local_minus_utc(),
    };
    f64::from(seconds) * 1000.0
}

fn local_time(t: f64) -> f64 {
    t + local_offset(t)
}

fn utc_time(t: f64) -> f64 {
    t - local_offset(t - local_offset(t))
}

fn now_ms() -> f64 {
    Utc::now().timestamp_millis() as f64
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

fn day_name(t: f64) -> &'static str {
    DAY_NAMES[week_day(t) as usize]
}

fn month_name(t: f64) -> &'static str {
    MONTH_NAMES[month_from_time(t) as usize]
}

fn offset_suffix(t: f64) -> String {
    let minutes = (local_offset(t) / MS_PER_MINUTE) as i32;
    let sign = if minutes >= 0 { '+' } else { '-' };
    let abs = minutes.unsigned_abs();
    format!("GMT{sign}{:02}{:02}", abs / 60, abs % 60)
}

fn format_date_part(lt: f64) -> String {
    format!(
        "{} {} {:02} {:04}",
        day_name(lt),
        month_name(lt),
        date_from_time(lt) as i32,
        year_from_time(lt) as i64
    )
}

fn format_time_part(t: f64, lt: f64) -> String {
    format!(
        "{:02}:{:02}:{:02} {}",
        hour_from_time(lt) as i32,
        min_from_time(lt) as i32,
        sec_from_time(lt) as i32,
        offset_suffix(t)
    )
}

/// `Date.prototype.toString` layout, e.g. `Tue Mar 04 2025 10:30:00 GMT+0100`.
fn format_date_string(t: f64) -> String {
    let lt = local_time(t);
    format!("{} {}", format_date_part(lt), format_time_part(t, lt))
}

fn format_utc_string(t: f64) -> String {
    format!(
        "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
        day_name(t),
        date_from_time(t) as i32,
        month_name(t),
        year_from_time(t) as i64,
        hour_from_time(t) as i32,
        min_from_time(t) as i32,
        sec_from_time(t) as i32
    )
}

fn format_iso_string(t: f64) -> String {
    let y = year_from_time(t) as i64;
    let year = if (0..=9999).contains(&y) {
        format!("{y:04}")
    } else if y >= 0 {
        format!("+{y:06}")
    } else {
        format!("-{:06}", y.unsigned_abs())
    };
    format!(
        "{year}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        month_from_time(t) as i32 + 1,
        date_from_time(t) as i32,
        hour_from_time(t) as i32,
        min_from_time(t) as i32,
        sec_from_time(t) as i32,
        ms_from_time(t) as i32
    )
}

fn digits(s: &str, start: usize, count: usize) -> Option<f64> {
    let text = s.get(start..start + count)?;
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// `Date.parse`: the ISO format `toISOString` produces (and its
/// shortenings), then the `toString` and `toUTCString` layouts.
fn parse_date_string(s: &str) -> f64 {
    let s = s.trim();
    parse_iso_date(s)
        .or_else(|| parse_text_date(s))
        .unwrap_or(f64::NAN)
}

fn parse_iso_date(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let (year, mut pos) = match bytes.first()? {
        b'+' | b'-' => {
            let sign = if bytes[0] == b'-' { -1.0 } else { 1.0 };
            (sign * digits(s, 1, 6)?, 7)
        }
        _ => (digits(s, 0, 4)?, 4),
    };
    let mut month = 1.0;
    let mut date = 1.0;
    if bytes.get(pos) == Some(&b'-') {
        month = digits(s, pos + 1, 2)?;
        pos += 3;
        if bytes.get(pos) == Some(&b'-') {
            date = digits(s, pos + 1, 2)?;
            pos += 3;
        }
    }
    if !(1.0..=12.0).contains(&month) || !(1.0..=31.0).contains(&date) {
        return None;
    }
    let (mut hour, mut minute, mut second, mut ms) = (0.0, 0.0, 0.0, 0.0);
    if matches!(bytes.get(pos), Some(b'T' | b't')) {
        hour = digits(s, pos + 1, 2)?;
        if bytes.get(pos + 3) != Some(&b':') {
            return None;
        }
        minute = digits(s, pos + 4, 2)?;
        pos += 6;
        if bytes.get(pos) == Some(&b':') {
            second = digits(s, pos + 1, 2)?;
            pos += 3;
            if bytes.get(pos) == Some(&b'.') {
                let end = bytes[pos + 1..]
                    .iter()
                    .position(|b| !b.is_ascii_digit())
                    .map_or(bytes.len(), |i| pos + 1 + i);
                let fraction = s.get(pos + 1..end)?;
                if fraction.is_empty() {
                    return None;
                }
                let padded = format!("{fraction:0<3}");
                ms = padded[..3].parse().ok()?;
                pos = end;
            }
        }
        if hour > 24.0 || minute > 59.0 || second > 59.0 {
            return None;
        }
    }
    let local = make_date(make_day(year, month - 1.0, date), make_time(hour, minute, second, ms));
    let offset = match bytes.get(pos) {
        None | Some(b'Z' | b'z') if pos + 1 >= bytes.len() => 0.0,
        Some(&sign @ (b'+' | b'-')) => {
            let h = digits(s, pos + 1, 2)?;
            let m = match bytes.get(pos + 3) {
                Some(b':') => digits(s, pos + 4, 2)?,
                _ => digits(s, pos + 3, 2).unwrap_or(0.0),
            };
            let sign = if sign == b'-' { -1.0 } else { 1.0 };
            sign * (h * 60.0 + m) * MS_PER_MINUTE
        }
        _ => return None,
    };
    Some(time_clip(local - offset))
}

fn parse_text_date(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let month_index = |p: &str| MONTH_NAMES.iter().position(|m| *m == p).map(|i| i as f64);
    // "Tue Mar 04 2025 10:30:00 GMT+0100" or "Tue, 04 Mar 2025 10:30:00 GMT"
    let (month, date, year) = match (parts.get(1).copied().and_then(month_index), parts.get(2).copied().and_then(month_index)) {
        (Some(m), _) => (m, parts.get(2)?.parse::<f64>().ok()?, parts.get(3)?.parse::<f64>().ok()?),
        (None, Some(m)) => (m, parts.get(1)?.parse::<f64>().ok()?, parts.get(3)?.parse::<f64>().ok()?),
        (None, None) => return None,
    };
    let time = match parts.get(4) {
        Some(clock) => {
            let fields: Vec<f64> = clock.split(':').map(|f| f.parse().ok()).collect::<Option<_>>()?;
            match fields.as_slice() {
                [h, m] => make_time(*h, *m, 0.0, 0.0),
                [h, m, sec] => make_time(*h, *m, *sec, 0.0),
                _ => return None,
            }
        }
        None => 0.0,
    };
    let wall = make_date(make_day(year, month, date), time);
    let Some(zone) = parts.get(5).and_then(|z| z.strip_prefix("GMT").or_else(|| z.strip_prefix("UTC"))) else {
        return Some(time_clip(utc_time(wall)));
    };
    if zone.is_empty() {
        return Some(time_clip(wall));
    }
    let sign = match zone.as_bytes()[0] {
        b'+' => 1.0,
        b'-' => -1.0,
        _ => return None,
    };
    let h = digits(zone, 1, 2)?;
    let m = digits(zone, 3, 2)?;
    Some(time_clip(wall - sign * (h * 60.0 + m) * MS_PER_MINUTE))
}

/// Date component a setter starts writing at, in `[year, month, date,
/// hours, minutes, seconds, ms]` order.
#[derive(Clone, Copy)]
enum Field {
    FullYear = 0,
    Month = 1,
    Date = 2,
    Hours = 3,
    Minutes = 4,
    Seconds = 5,
    Milliseconds = 6,
}

impl Field {
    /// Number of arguments the setter accepts.
    fn arity(self) -> usize {
        let start = self as usize;
        if start <= 2 { 3 - start } else { 7 - start }
    }
}

fn components(t: f64) -> [f64; 7] {
    [
        year_from_time(t),
        month_from_time(t),
        date_from_time(t),
        hour_from_time(t),
        min_from_time(t),
        sec_from_time(t),
        ms_from_time(t),
    ]
}

fn compose(c: &[f64; 7]) -> f64 {
    make_date(make_day(c[0], c[1], c[2]), make_time(c[3], c[4], c[5], c[6]))
}

impl Interpreter {
    fn this_time_value(&self, this: &JsValue, method: &str) -> JsResult<f64> {
        if let JsValue::Object(o) = this
            && let ObjectKind::Date(t) = self.get_object(*o).borrow().kind
        {
            return Ok(t);
        }
        Err(JsError::type_error(format!("Date.prototype.{method} called on a non-Date object")))
    }

    fn set_time_value(&self, this: &JsValue, t: f64) {
        if let JsValue::Object(o) = this {
            self.get_object(*o).borrow_mut().kind = ObjectKind::Date(t);
        }
    }

    fn create_date(&mut self, t: f64) -> JsObject {
        let data = JsObjectData::with_kind(Some(self.realm.date_prototype), "Date", ObjectKind::Date(t));
        self.alloc(data)
    }

    /// Year, month and the optional components of `new Date(...)` / `Date.UTC`.
    fn date_from_components(&mut self, args: &[JsValue]) -> JsResult<f64> {
        let mut c = [f64::NAN, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        for (slot, a) in c.iter_mut().zip(args) {
            *slot = self.to_number(a)?;
        }
        if !c[0].is_nan() {
            let y = c[0].trunc();
            if (0.0..=99.0).contains(&y) {
                c[0] = 1900.0 + y;
            }
        }
        Ok(compose(&c))
    }

    fn construct_date(&mut self, args: &[JsValue]) -> JsResult<JsValue> {
        let t = match args {
            [] => now_ms(),
            [value] => match self.to_primitive(value, None)? {
                JsValue::String(s) => parse_date_string(&s.to_rust_string()),
                v => time_clip(self.to_number(&v)?),
            },
            _ => time_clip(utc_time(self.date_from_components(args)?)),
        };
        Ok(JsValue::Object(self.create_date(t)))
    }

    fn date_setter(&mut self, this: &JsValue, args: &[JsValue], field: Field, local: bool, method: &str) -> JsResult<JsValue> {
        let t = self.this_time_value(this, method)?;
        let mut base = if local { local_time(t) } else { t };
        if matches!(field, Field::FullYear) && base.is_nan() {
            base = 0.0;
        }
        let mut c = components(base);
        let start = field as usize;
        let count = args.len().clamp(1, field.arity());
        for i in 0..count {
            c[start + i] = self.to_number(&arg(args, i))?;
        }
        let composed = compose(&c);
        let v = time_clip(if local { utc_time(composed) } else { composed });
        self.set_time_value(this, v);
        Ok(JsValue::Number(v))
    }

    fn date_string(&self, this: &JsValue, method: &str, format: fn(f64) -> String) -> JsResult<JsValue> {
        let t = self.this_time_value(this, method)?;
        if t.is_nan() {
            return Ok(JsValue::from_str("Invalid Date"));
        }
        Ok(JsValue::from_str(&format(t)))
    }

    pub(crate) fn setup_date(&mut self) {
        let proto = self.realm.date_prototype;
        let ctor = self.native_constructor(
            "Date",
            7,
            Rc::new(|_interp, _this, _args| Ok(JsValue::from_str(&format_date_string(now_ms())))),
            Rc::new(|interp, args| interp.construct_date(args)),
            proto,
        );
        let statics: Methods = vec![
            (
                "parse",
                1,
                Rc::new(|interp, _this, args| {
                    let s = interp.to_string(&arg(args, 0))?;
                    Ok(JsValue::Number(parse_date_string(&s.to_rust_string())))
                }),
            ),
            (
                "UTC",
                7,
                Rc::new(|interp, _this, args| Ok(JsValue::Number(time_clip(interp.date_from_components(args)?)))),
            ),
            ("now", 0, Rc::new(|_interp, _this, _args| Ok(JsValue::Number(now_ms())))),
        ];
        self.define_methods(ctor, statics);

        let getters: [(&'static str, bool, fn(f64) -> f64); 16] = [
            ("getFullYear", true, year_from_time),
            ("getUTCFullYear", false, year_from_time),
            ("getMonth", true, month_from_time),
            ("getUTCMonth", false, month_from_time),
            ("getDate", true, date_from_time),
            ("getUTCDate", false, date_from_time),
            ("getDay", true, week_day),
            ("getUTCDay", false, week_day),
            ("getHours", true, hour_from_time),
            ("getUTCHours", false, hour_from_time),
            ("getMinutes", true, min_from_time),
            ("getUTCMinutes", false, min_from_time),
            ("getSeconds", true, sec_from_time),
            ("getUTCSeconds", false, sec_from_time),
            ("getMilliseconds", true, ms_from_time),
            ("getUTCMilliseconds", false, ms_from_time),
        ];
        let mut methods: Methods = getters
            .into_iter()
            .map(|(name, local, part)| {
                let call: NativeFn = Rc::new(move |interp, this, _args| {
                    let t = interp.this_time_value(this, name)?;
                    if t.is_nan() {
                        return Ok(JsValue::Number(f64::NAN));
                    }
                    Ok(JsValue::Number(part(if local { local_time(t) } else { t })))
                });
                (name, 0, call)
            })
            .collect();

        let setters = [
            ("setMilliseconds", Field::Milliseconds, true),
            ("setUTCMilliseconds", Field::Milliseconds, false),
            ("setSeconds", Field::Seconds, true),
            ("setUTCSeconds", Field::Seconds, false),
            ("setMinutes", Field::Minutes, true),
            ("setUTCMinutes", Field::Minutes, false),
            ("setHours", Field::Hours, true),
            ("setUTCHours", Field::Hours, false),
            ("setDate", Field::Date, true),
            ("setUTCDate", Field::Date, false),
            ("setMonth", Field::Month, true),
            ("setUTCMonth", Field::Month, false),
            ("setFullYear", Field::FullYear, true),
            ("setUTCFullYear", Field::FullYear, false),
        ];
        for (name, field, local) in setters {
            let call: NativeFn = Rc::new(move |interp, this, args| interp.date_setter(this, args, field, local, name));
            methods.push((name, field.arity(), call));
        }

        let formatters: [(&'static str, fn(f64) -> String); 7] = [
            ("toString", format_date_string),
            ("toLocaleString", format_date_string),
            ("toDateString", |t| format_date_part(local_time(t))),
            ("toLocaleDateString", |t| format_date_part(local_time(t))),
            ("toTimeString", |t| format_time_part(t, local_time(t))),
            ("toLocaleTimeString", |t| format_time_part(t, local_time(t))),
            ("toUTCString", format_utc_string),
        ];
        for (name, format) in formatters {
            let call: NativeFn = Rc::new(move |interp, this, _args| interp.date_string(this, name, format));
            methods.push((name, 0, call));
        }

        methods.extend::<Methods>(vec![
            (
                "getTime",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::Number(interp.this_time_value(this, "getTime")?))),
            ),
            (
                "valueOf",
                0,
                Rc::new(|interp, this, _args| Ok(JsValue::Number(interp.this_time_value(this, "valueOf")?))),
            ),
            (
                "getTimezoneOffset",
                0,
                Rc::new(|interp, this, _args| {
                    let t = interp.this_time_value(this, "getTimezoneOffset")?;
                    if t.is_nan() {
                        return Ok(JsValue::Number(f64::NAN));
                    }
                    Ok(JsValue::Number((t - local_time(t)) / MS_PER_MINUTE))
                }),
            ),
            (
                "setTime",
                1,
                Rc::new(|interp, this, args| {
                    interp.this_time_value(this, "setTime")?;
                    let v = time_clip(interp.to_number(&arg(args, 0))?);
                    interp.set_time_value(this, v);
                    Ok(JsValue::Number(v))
                }),
            ),
            (
                "toISOString",
                0,
                Rc::new(|interp, this, _args| {
                    let t = interp.this_time_value(this, "toISOString")?;
                    if !t.is_finite() {
                        return Err(JsError::range_error("Invalid time value"));
                    }
                    Ok(JsValue::from_str(&format_iso_string(t)))
                }),
            ),
            (
                "toJSON",
                1,
                Rc::new(|interp, this, _args| {
                    let o = interp.to_object(this)?;
                    let tv = interp.to_primitive(&JsValue::Object(o), Some(Hint::Number))?;
                    if let JsValue::Number(n) = tv
                        && !n.is_finite()
                    {
                        return Ok(JsValue::Null);
                    }
                    let to_iso = interp.get(o, "toISOString")?;
                    if !interp.is_callable(&to_iso) {
                        return Err(JsError::type_error("toISOString is not a function"));
                    }
                    interp.call(&to_iso, JsValue::Object(o), &[])
                }),
            ),
        ]);
        self.define_methods(proto, methods);
    }
}
