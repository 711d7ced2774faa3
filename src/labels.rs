//! Display labels.
//!
//! Lookup tables from engine codes to user-facing text. The engine itself
//! never formats text for display; front ends call these.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::models::{Equipment, SlotType, TimeSlot, UnscheduledReason};

/// Display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    Chinese,
}

const DAYS_EN: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const DAYS_ZH: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

/// Name of an ISO day of week (1 = Monday). Out-of-range days give `"?"`.
pub fn day_of_week(day: u8, locale: Locale) -> &'static str {
    let table = match locale {
        Locale::English => &DAYS_EN,
        Locale::Chinese => &DAYS_ZH,
    };
    usize::from(day)
        .checked_sub(1)
        .and_then(|i| table.get(i))
        .copied()
        .unwrap_or("?")
}

pub fn slot_type(slot_type: SlotType, locale: Locale) -> &'static str {
    match (slot_type, locale) {
        (SlotType::Morning, Locale::English) => "Morning",
        (SlotType::Afternoon, Locale::English) => "Afternoon",
        (SlotType::Evening, Locale::English) => "Evening",
        (SlotType::Morning, Locale::Chinese) => "上午",
        (SlotType::Afternoon, Locale::Chinese) => "下午",
        (SlotType::Evening, Locale::Chinese) => "晚上",
    }
}

/// Name of an equipment tag. Custom tags are shown verbatim.
pub fn equipment(equipment: &Equipment, locale: Locale) -> Cow<'static, str> {
    let text = match (equipment, locale) {
        (Equipment::Custom(name), _) => return Cow::Owned(name.clone()),
        (Equipment::Projector, Locale::English) => "Projector",
        (Equipment::Audio, Locale::English) => "Audio system",
        (Equipment::Computer, Locale::English) => "Computers",
        (Equipment::Network, Locale::English) => "Network",
        (Equipment::AirConditioning, Locale::English) => "Air conditioning",
        (Equipment::Laboratory, Locale::English) => "Laboratory fittings",
        (Equipment::Projector, Locale::Chinese) => "投影仪",
        (Equipment::Audio, Locale::Chinese) => "音响设备",
        (Equipment::Computer, Locale::Chinese) => "计算机",
        (Equipment::Network, Locale::Chinese) => "网络",
        (Equipment::AirConditioning, Locale::Chinese) => "空调",
        (Equipment::Laboratory, Locale::Chinese) => "实验设备",
    };
    Cow::Borrowed(text)
}

/// Explanation of why a section was not scheduled.
pub fn unscheduled_reason(reason: UnscheduledReason, locale: Locale) -> &'static str {
    use UnscheduledReason::*;
    match locale {
        Locale::English => match reason {
            NoFeasibleSlot => "no conflict-free classroom and time slot remained",
            CapacityExceeded => "no classroom is large enough",
            TypeMismatch => "no classroom suits the course type",
            EquipmentMissing => "no classroom has the required equipment",
            TeacherUnavailable => "the teacher is unavailable in every time slot",
            BudgetExhausted => "the search budget ran out first",
            Cancelled => "the run was cancelled first",
        },
        Locale::Chinese => match reason {
            NoFeasibleSlot => "没有无冲突的教室和时间段",
            CapacityExceeded => "没有容量足够的教室",
            TypeMismatch => "没有适合该课程类型的教室",
            EquipmentMissing => "没有具备所需设备的教室",
            TeacherUnavailable => "教师在所有时间段均不可用",
            BudgetExhausted => "排课预算已用尽",
            Cancelled => "排课已被取消",
        },
    }
}

/// Minutes since midnight as `HH:MM`.
pub fn clock(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// One-line description of a time slot, e.g. `Monday P1 08:00-08:45`.
pub fn time_slot(slot: &TimeSlot, locale: Locale) -> String {
    format!(
        "{} P{} {}-{}",
        day_of_week(slot.day_of_week, locale),
        slot.period_number,
        clock(slot.start_time),
        clock(slot.end_time)
    )
}
