use std::{collections::HashMap, str::FromStr};

use axum::extract::Multipart;
use rust_decimal::Decimal;
use serde::Serialize;
use time::{macros::format_description, Date};

use super::clock::{is_offered_minute, ClockTime12, Meridiem};
use crate::{
    errors::{AppError, FieldErrors},
    images::{validate_upload, UploadItem},
};

const REQUIRED: &str = "This field is required.";

/// Text fields as submitted, kept so an invalid form can be echoed back.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FormValues(HashMap<String, String>);

impl FormValues {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Initial values shown on a blank form.
    pub fn initial(today: Date) -> Self {
        let mut v = Self::default();
        v.set("date", today.to_string());
        v.set("sleep_hour", "10");
        v.set("sleep_minute", "00");
        v.set("sleep_ampm", "PM");
        v.set("wakeup_hour", "7");
        v.set("wakeup_minute", "00");
        v.set("wakeup_ampm", "AM");
        v
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    pub values: FormValues,
    pub image: Option<UploadItem>,
}

/// A fully validated submission.
#[derive(Debug, Clone)]
pub struct HealthMetricsInput {
    pub date: Date,
    pub weight: Decimal,
    pub thigh_length: Decimal,
    pub hip_length: Decimal,
    pub sleep: ClockTime12,
    pub wakeup: ClockTime12,
    pub image: Option<UploadItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormChoices {
    pub hours: Vec<String>,
    pub minutes: Vec<String>,
    pub meridiems: [&'static str; 2],
}

impl Default for FormChoices {
    fn default() -> Self {
        Self {
            hours: (1..=12).map(|h: u8| h.to_string()).collect(),
            minutes: (0..60).step_by(5).map(|m: u8| format!("{:02}", m)).collect(),
            meridiems: ["AM", "PM"],
        }
    }
}

/// Drains the multipart body. Text parts land in `values`, the `image` part
/// becomes the upload; an empty file part counts as no image.
pub async fn read_multipart(mut mp: Multipart) -> Result<RawSubmission, AppError> {
    let mut raw = RawSubmission::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let body = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?;
            if !body.is_empty() {
                raw.image = Some(UploadItem {
                    filename,
                    content_type,
                    body,
                });
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?;
            raw.values.set(&name, text);
        }
    }
    Ok(raw)
}

pub fn validate(
    raw: RawSubmission,
    max_upload_bytes: usize,
) -> Result<HealthMetricsInput, (FormValues, FieldErrors)> {
    let mut errors = FieldErrors::new();
    let v = &raw.values;

    let date = required(v, "date", &mut errors).and_then(|s| {
        let fmt = format_description!("[year]-[month]-[day]");
        Date::parse(s, &fmt)
            .map_err(|_| errors.add("date", "Enter a valid date."))
            .ok()
    });

    let weight = measurement(v, "weight", &mut errors);
    let thigh_length = measurement(v, "thigh_length", &mut errors);
    let hip_length = measurement(v, "hip_length", &mut errors);
    let sleep = clock_fields(v, "sleep", &mut errors);
    let wakeup = clock_fields(v, "wakeup", &mut errors);

    if let Some(img) = &raw.image {
        if let Err(msg) = validate_upload(img, max_upload_bytes) {
            errors.add("image", msg);
        }
    }

    match (date, weight, thigh_length, hip_length, sleep, wakeup) {
        (Some(date), Some(weight), Some(thigh_length), Some(hip_length), Some(sleep), Some(wakeup))
            if errors.is_empty() =>
        {
            Ok(HealthMetricsInput {
                date,
                weight,
                thigh_length,
                hip_length,
                sleep,
                wakeup,
                image: raw.image,
            })
        }
        _ => Err((raw.values, errors)),
    }
}

fn required<'a>(v: &'a FormValues, field: &str, errors: &mut FieldErrors) -> Option<&'a str> {
    let got = v.get(field);
    if got.is_none() {
        errors.add(field, REQUIRED);
    }
    got
}

/// Up to 5 digits with at most 2 after the point, never negative.
fn measurement(v: &FormValues, field: &str, errors: &mut FieldErrors) -> Option<Decimal> {
    let s = required(v, field, errors)?;
    let Ok(d) = Decimal::from_str(s) else {
        errors.add(field, "Enter a number.");
        return None;
    };
    let d = d.normalize();
    if d.is_sign_negative() && !d.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        return None;
    }
    if d.scale() > 2 {
        errors.add(field, "Ensure that there are no more than 2 decimal places.");
        return None;
    }
    if d.trunc().abs() >= Decimal::from(1000) {
        errors.add(field, "Ensure that there are no more than 5 digits in total.");
        return None;
    }
    Some(d)
}

fn clock_fields(v: &FormValues, prefix: &str, errors: &mut FieldErrors) -> Option<ClockTime12> {
    let hour = choice(v, &format!("{}_hour", prefix), errors, |s| {
        s.parse::<u8>().ok().filter(|h| (1..=12).contains(h))
    });
    let minute = choice(v, &format!("{}_minute", prefix), errors, |s| {
        s.parse::<u8>().ok().filter(|m| is_offered_minute(*m))
    });
    let meridiem = choice(v, &format!("{}_ampm", prefix), errors, |s| {
        Meridiem::from_str(s).ok()
    });
    Some(ClockTime12::new(hour?, minute?, meridiem?))
}

fn choice<T>(
    v: &FormValues,
    field: &str,
    errors: &mut FieldErrors,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let s = required(v, field, errors)?;
    let parsed = parse(s);
    if parsed.is_none() {
        errors.add(
            field,
            format!("Select a valid choice. {} is not one of the available choices.", s),
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use time::macros::date;

    fn filled() -> RawSubmission {
        let mut values = FormValues::default();
        for (k, val) in [
            ("date", "2025-10-15"),
            ("weight", "70.5"),
            ("thigh_length", "58.0"),
            ("hip_length", "95.0"),
            ("sleep_hour", "10"),
            ("sleep_minute", "30"),
            ("sleep_ampm", "PM"),
            ("wakeup_hour", "7"),
            ("wakeup_minute", "00"),
            ("wakeup_ampm", "AM"),
        ] {
            values.set(k, val);
        }
        RawSubmission { values, image: None }
    }

    const MAX: usize = 5 * 1024 * 1024;

    #[test]
    fn accepts_a_complete_submission() {
        let input = validate(filled(), MAX).unwrap();
        assert_eq!(input.date, date!(2025-10-15));
        assert_eq!(input.weight, Decimal::new(705, 1));
        assert_eq!(input.sleep, ClockTime12::new(10, 30, Meridiem::Pm));
        assert_eq!(input.wakeup, ClockTime12::new(7, 0, Meridiem::Am));
        assert!(input.image.is_none());
    }

    #[test]
    fn missing_fields_are_reported_individually() {
        let mut raw = filled();
        raw.values.set("weight", "  ");
        raw.values.set("wakeup_ampm", "");
        let (echo, errors) = validate(raw, MAX).unwrap_err();
        assert_eq!(errors.get("weight").unwrap(), [REQUIRED.to_string()]);
        assert!(errors.contains("wakeup_ampm"));
        assert!(!errors.contains("date"));
        assert_eq!(echo.get("hip_length"), Some("95.0"));
    }

    #[test]
    fn rejects_values_off_the_dropdowns() {
        let mut raw = filled();
        raw.values.set("sleep_hour", "13");
        raw.values.set("sleep_minute", "07");
        raw.values.set("sleep_ampm", "XM");
        let (_, errors) = validate(raw, MAX).unwrap_err();
        assert!(errors.get("sleep_hour").unwrap()[0].contains("13 is not one of"));
        assert!(errors.contains("sleep_minute"));
        assert!(errors.contains("sleep_ampm"));
    }

    #[test]
    fn decimal_precision_rules() {
        let mut raw = filled();
        raw.values.set("weight", "70.555");
        raw.values.set("thigh_length", "1000");
        raw.values.set("hip_length", "abc");
        let (_, errors) = validate(raw, MAX).unwrap_err();
        assert!(errors.get("weight").unwrap()[0].contains("2 decimal places"));
        assert!(errors.get("thigh_length").unwrap()[0].contains("5 digits"));
        assert_eq!(errors.get("hip_length").unwrap()[0], "Enter a number.");

        let mut raw = filled();
        raw.values.set("weight", "999.90");
        assert!(validate(raw, MAX).is_ok());
    }

    #[test]
    fn bad_date_is_rejected() {
        let mut raw = filled();
        raw.values.set("date", "15/10/2025");
        let (_, errors) = validate(raw, MAX).unwrap_err();
        assert_eq!(errors.get("date").unwrap()[0], "Enter a valid date.");
    }

    #[test]
    fn oversized_image_blocks_the_whole_form() {
        let mut raw = filled();
        raw.image = Some(UploadItem {
            filename: "big.jpg".into(),
            content_type: Some("image/jpeg".into()),
            body: Bytes::from(vec![0u8; MAX + 1]),
        });
        let (_, errors) = validate(raw, MAX).unwrap_err();
        assert!(errors.get("image").unwrap()[0].starts_with("Image file too large."));
    }

    #[test]
    fn initial_values_match_dropdown_defaults() {
        let v = FormValues::initial(date!(2025-10-15));
        assert_eq!(v.get("date"), Some("2025-10-15"));
        assert_eq!(v.get("sleep_ampm"), Some("PM"));
        assert_eq!(v.get("wakeup_hour"), Some("7"));
        let c = FormChoices::default();
        assert_eq!(c.hours.len(), 12);
        assert_eq!(c.minutes.first().map(String::as_str), Some("00"));
        assert_eq!(c.minutes.last().map(String::as_str), Some("55"));
    }
}
