//! Student / Community fixture schema and dataset.
//!
//! `Student.community` and `Community.students` reference each other, so
//! paths such as `students.community.className` resolve in either direction.

use crate::{
    backend::Row,
    model::{EntityModel, FieldKind, FieldModel},
    value::Value,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

pub static STUDENT: EntityModel = EntityModel {
    name: "Student",
    fields: &[
        FieldModel::new("id", FieldKind::Long),
        FieldModel::new("firstName", FieldKind::Text),
        FieldModel::new("lastName", FieldKind::Text),
        FieldModel::new("email", FieldKind::Text),
        FieldModel::new("phoneNumber", FieldKind::Text).nullable(),
        FieldModel::new("address", FieldKind::Text).nullable(),
        FieldModel::new("additionalInfo", FieldKind::Text).nullable(),
        FieldModel::new("gpa", FieldKind::Double),
        FieldModel::new("gpaLetter", FieldKind::Text),
        FieldModel::new("isFullTime", FieldKind::Bool),
        FieldModel::new("credits", FieldKind::Int),
        FieldModel::new("dateOfBirth", FieldKind::Date).nullable(),
        FieldModel::new("enrollmentDate", FieldKind::Date).nullable(),
        FieldModel::new("lastLogin", FieldKind::DateTime).nullable(),
        FieldModel::new("updatedAt", FieldKind::OffsetDateTime).nullable(),
        FieldModel::new("avatar", FieldKind::Other("Blob")).nullable(),
        FieldModel::new("community", FieldKind::Relation(&COMMUNITY)).nullable(),
    ],
};

pub static COMMUNITY: EntityModel = EntityModel {
    name: "Community",
    fields: &[
        FieldModel::new("id", FieldKind::Long),
        FieldModel::new("className", FieldKind::Text),
        FieldModel::new("students", FieldKind::Collection(&STUDENT)),
    ],
};

///
/// Community
///

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Community {
    pub id: i64,
    pub class_name: &'static str,
}

impl Row for Community {
    fn value(&self, path: &[String]) -> Value {
        match path {
            [field] => match field.as_str() {
                "id" => self.id.into(),
                "className" => self.class_name.into(),
                _ => Value::Null,
            },
            _ => Value::Null,
        }
    }
}

///
/// Student
///

#[derive(Clone, Debug, PartialEq)]
pub struct Student {
    pub id: i64,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<&'static str>,
    pub additional_info: Option<&'static str>,
    pub gpa: f64,
    pub gpa_letter: &'static str,
    pub is_full_time: bool,
    pub credits: i32,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_date: Option<NaiveDate>,
    pub last_login: Option<NaiveDateTime>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub community: Option<Community>,
}

impl Student {
    fn field(&self, name: &str) -> Value {
        match name {
            "id" => self.id.into(),
            "firstName" => self.first_name.into(),
            "lastName" => self.last_name.into(),
            "email" => self.email.clone().into(),
            "phoneNumber" => self.phone_number.clone().into(),
            "address" => self.address.into(),
            "additionalInfo" => self.additional_info.into(),
            "gpa" => self.gpa.into(),
            "gpaLetter" => self.gpa_letter.into(),
            "isFullTime" => self.is_full_time.into(),
            "credits" => self.credits.into(),
            "dateOfBirth" => self.date_of_birth.into(),
            "enrollmentDate" => self.enrollment_date.into(),
            "lastLogin" => self.last_login.into(),
            "updatedAt" => self.updated_at.into(),
            "community" => self.community.map(|c| c.id).into(),
            _ => Value::Null,
        }
    }
}

impl Row for Student {
    fn value(&self, path: &[String]) -> Value {
        match path {
            [field] => self.field(field),
            [relation, rest @ ..] if relation == "community" => self
                .community
                .as_ref()
                .map_or(Value::Null, |community| community.value(rest)),
            _ => Value::Null,
        }
    }
}

//
// Dataset
//

const COMMUNITIES: [Community; 4] = [
    Community {
        id: 1,
        class_name: "Class 9A",
    },
    Community {
        id: 2,
        class_name: "Class 10B",
    },
    Community {
        id: 3,
        class_name: "Class 9C",
    },
    Community {
        id: 5,
        class_name: "Class 11A",
    },
];

type Seed = (
    i64,
    &'static str,
    &'static str,
    f64,
    &'static str,
    bool,
    Option<i64>,
    Option<(i32, u32, u32)>,
);

#[rustfmt::skip]
const SEEDS: [Seed; 20] = [
    (1,  "Aya",    "Refai",   3.9,  "A",  true,  Some(1), Some((2001, 3, 14))),
    (2,  "Omar",   "Haddad",  3.2,  "B+", true,  Some(1), Some((2000, 11, 2))),
    (3,  "Lina",   "Saleh",   3.6,  "A-", true,  Some(2), Some((2002, 1, 23))),
    (4,  "Sami",   "Khoury",  2.8,  "B-", true,  Some(5), Some((1999, 8, 30))),
    (5,  "Rana",   "Nasser",  3.95, "A+", true,  Some(5), Some((2001, 6, 5))),
    (6,  "Yousef", "Amin",    3.2,  "B+", true,  Some(3), Some((2000, 2, 17))),
    (7,  "Hala",   "Mansour", 3.75, "A-", true,  None,    Some((1997, 5, 7))),
    (8,  "Karim",  "Fares",   3.0,  "B",  true,  Some(2), Some((2001, 12, 9))),
    (9,  "Dana",   "Issa",    3.85, "A",  true,  Some(3), Some((2002, 4, 11))),
    (10, "Tariq",  "Zaid",    2.5,  "C+", false, Some(5), Some((1998, 10, 21))),
    (11, "Maya",   "Jaber",   3.4,  "B+", true,  Some(1), Some((2001, 7, 28))),
    (12, "Ziad",   "Hamdan",  3.7,  "A-", true,  Some(2), Some((2000, 9, 3))),
    (13, "Nour",   "Khalil",  3.95, "A",  true,  None,    Some((2002, 2, 14))),
    (14, "Fadi",   "Sabbagh", 3.1,  "B",  true,  Some(3), Some((1999, 12, 25))),
    (15, "Salma",  "Odeh",    3.9,  "A",  true,  Some(5), Some((2001, 1, 19))),
    (16, "Bilal",  "Qasem",   2.9,  "B-", false, None,    None),
    (17, "Reem",   "Awad",    3.8,  "A",  true,  Some(1), Some((2000, 6, 30))),
    (18, "Hadi",   "Musa",    3.65, "A-", true,  Some(2), Some((2002, 8, 8))),
    (19, "Jana",   "Tamimi",  4.0,  "A+", true,  Some(3), Some((2001, 5, 16))),
    (20, "Adam",   "Yasin",   3.3,  "B+", true,  Some(1), Some((2000, 3, 1))),
];

#[must_use]
pub fn communities() -> Vec<Community> {
    COMMUNITIES.to_vec()
}

/// The twenty fixture students, ordered by id.
#[must_use]
pub fn students() -> Vec<Student> {
    SEEDS.iter().copied().map(student).collect()
}

fn student(
    (id, first_name, last_name, gpa, gpa_letter, is_full_time, community, born): Seed,
) -> Student {
    let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d);
    let enrolled = born.and_then(|(y, _, _)| date((y + 18, 9, 1)));

    Student {
        id,
        first_name,
        last_name,
        email: format!(
            "{}.{}@school.edu",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
        phone_number: (id % 4 != 0).then(|| format!("+962-7-5550-{id:04}")),
        address: (id % 3 == 0).then_some("Amman"),
        additional_info: (id == 7).then_some("transfer student"),
        gpa,
        gpa_letter,
        is_full_time,
        credits: i32::try_from(id * 3).unwrap_or(i32::MAX),
        date_of_birth: born.and_then(date),
        enrollment_date: enrolled,
        last_login: enrolled
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .filter(|_| id % 2 == 0),
        updated_at: FixedOffset::east_opt(3 * 3600)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).single())
            .filter(|_| id <= 10),
        community: community.and_then(|cid| COMMUNITIES.into_iter().find(|c| c.id == cid)),
    }
}
