//! In-process store used when no `DATABASE_URL` is configured and by the router tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Address, EducationLevel, Infrastructure, LevelKind, MediaItem, MediaKind, MediaParent,
    NewMedia, School, SchoolRow, SchoolSummary, UserRole,
};
use crate::database::store::{ListQuery, MediaStore, RoleStore, SchoolStore};
use crate::types::{Role, UserId};
use crate::validation::schema::{
    AddressPayload, EducationLevelPayload, InfrastructurePayload, SchoolPayload, SchoolUpdate,
};

#[derive(Default)]
struct State {
    schools: BTreeMap<i64, School>,
    roles: HashMap<UserId, UserRole>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn level_mut(&mut self, kind: LevelKind, level_id: i64) -> Option<&mut EducationLevel> {
        self.schools.values_mut().find_map(|school| {
            let level = match kind {
                LevelKind::Primary => &mut school.primary_level,
                LevelKind::Basic => &mut school.basic_level,
                LevelKind::Secondary => &mut school.secondary_level,
            };
            (level.id == level_id).then_some(level)
        })
    }

    fn parent_exists(&mut self, parent: &MediaParent) -> bool {
        match *parent {
            MediaParent::School(id) => self.schools.contains_key(&id),
            MediaParent::Primary(id) => self.level_mut(LevelKind::Primary, id).is_some(),
            MediaParent::Basic(id) => self.level_mut(LevelKind::Basic, id).is_some(),
            MediaParent::Secondary(id) => self.level_mut(LevelKind::Secondary, id).is_some(),
        }
    }

    fn attach(&mut self, item: MediaItem) {
        let slot = match item.parent {
            MediaParent::School(id) => self.schools.get_mut(&id).map(|s| &mut s.media),
            MediaParent::Primary(id) => self.level_mut(LevelKind::Primary, id).map(|l| &mut l.media),
            MediaParent::Basic(id) => self.level_mut(LevelKind::Basic, id).map(|l| &mut l.media),
            MediaParent::Secondary(id) => {
                self.level_mut(LevelKind::Secondary, id).map(|l| &mut l.media)
            }
        };
        if let Some(media) = slot {
            media.push(item);
        }
    }
}

/// Volatile store with the same observable behavior as the PostgreSQL one.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching(&self, query: &ListQuery) -> Vec<School> {
        let state = self.state.read().await;
        let mut schools: Vec<School> = state
            .schools
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        schools.sort_by(|a, b| {
            (b.record.created_at, b.record.id).cmp(&(a.record.created_at, a.record.id))
        });
        match query.page {
            Some(page) => schools
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.page_size as usize)
                .collect(),
            None => schools,
        }
    }
}

fn address_from(id: i64, school_id: i64, p: &AddressPayload) -> Address {
    Address {
        id,
        school_id,
        city: p.city.clone(),
        district: p.district.clone(),
        street: p.street.clone(),
        zip_code: p.zip_code.clone(),
    }
}

fn infrastructure_from(id: i64, school_id: i64, p: &InfrastructurePayload) -> Infrastructure {
    Infrastructure {
        id,
        school_id,
        has_library: p.has_library,
        has_gym: p.has_gym,
        has_swimming_pool: p.has_swimming_pool,
        has_cafeteria: p.has_cafeteria,
        has_medical_room: p.has_medical_room,
        has_playground: p.has_playground,
        has_computer_lab: p.has_computer_lab,
        has_science_lab: p.has_science_lab,
        has_parking: p.has_parking,
        has_wheelchair_access: p.has_wheelchair_access,
        building_area: p.building_area,
        yard_area: p.yard_area,
        comment: p.comment.clone(),
    }
}

/// Replaces every column of `level` except identity and media.
fn write_level(level: &mut EducationLevel, p: &EducationLevelPayload) {
    level.price = p.price;
    level.discount_info = p.discount_info.clone();
    level.capacity = p.capacity;
    level.students_per_class = p.students_per_class;
    level.starts_at = p.starts_at.clone();
    level.ends_at = p.ends_at.clone();
    level.meals_included = p.meals_included;
    level.meals_comment = p.meals_comment.clone();
    level.transport_available = p.transport_available;
    level.transport_comment = p.transport_comment.clone();
    level.extended_day = p.extended_day;
    level.sports_clubs = p.sports_clubs.clone();
    level.foreign_languages = p.foreign_languages.clone();
    level.extracurricular = p.extracurricular.clone();
    level.admission_comment = p.admission_comment.clone();
}

macro_rules! assign_if_present {
    ($target:expr, $changes:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(v) = &$changes.$field {
                $target.$field = v.clone().into();
            }
        )*
    };
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<School>, DatabaseError> {
        Ok(self.matching(query).await)
    }

    async fn list_summaries(&self, query: &ListQuery) -> Result<Vec<SchoolSummary>, DatabaseError> {
        let schools = self.matching(query).await;
        let state = self.state.read().await;
        Ok(schools
            .iter()
            .map(|s| {
                let email = state.roles.get(s.owner()).and_then(|r| r.email.clone());
                SchoolSummary::new(&s.record, Some(&s.address), email)
            })
            .collect())
    }

    async fn count(&self, query: &ListQuery) -> Result<i64, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.schools.values().filter(|s| query.matches(s)).count() as i64)
    }

    async fn find(&self, id: i64) -> Result<Option<School>, DatabaseError> {
        Ok(self.state.read().await.schools.get(&id).cloned())
    }

    async fn owner_of(&self, id: i64) -> Result<Option<UserId>, DatabaseError> {
        Ok(self
            .state
            .read()
            .await
            .schools
            .get(&id)
            .map(|s| s.owner().to_string()))
    }

    async fn create(&self, payload: &SchoolPayload, owner: &str) -> Result<School, DatabaseError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let id = state.next_id();

        let record = SchoolRow {
            id,
            name: payload.name.clone(),
            phone_number1: payload.phone_number1.clone(),
            phone_number2: payload.phone_number2.clone(),
            phone_number3: payload.phone_number3.clone(),
            email: payload.email.clone(),
            website: payload.website.clone(),
            facebook_url: payload.facebook_url.clone(),
            instagram_url: payload.instagram_url.clone(),
            logo_url: payload.logo_url.clone(),
            director_name: payload.director_name.clone(),
            deputy_director_name: payload.deputy_director_name.clone(),
            founded_year: payload.founded_year,
            description: payload.description.clone(),
            history: payload.history.clone(),
            mission: payload.mission.clone(),
            has_uniform: payload.has_uniform,
            uniform_comment: payload.uniform_comment.clone(),
            has_security: payload.has_security,
            security_comment: payload.security_comment.clone(),
            has_psychologist: payload.has_psychologist,
            psychologist_comment: payload.psychologist_comment.clone(),
            has_special_needs_support: payload.has_special_needs_support,
            special_needs_comment: payload.special_needs_comment.clone(),
            created_by: owner.to_string(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        };

        let address = address_from(state.next_id(), id, &payload.address);
        let infrastructure = infrastructure_from(state.next_id(), id, &payload.infrastructure);

        let mut build_level = |kind: LevelKind, p: &EducationLevelPayload| {
            let level_id = state.next_id();
            let mut level = EducationLevel {
                id: level_id,
                school_id: id,
                ..Default::default()
            };
            write_level(&mut level, p);
            for url in &p.photos {
                let media_id = state.next_id();
                level.media.push(MediaItem {
                    id: media_id,
                    media_url: url.clone(),
                    description: None,
                    media_type: MediaKind::Photo,
                    parent: match kind {
                        LevelKind::Primary => MediaParent::Primary(level_id),
                        LevelKind::Basic => MediaParent::Basic(level_id),
                        LevelKind::Secondary => MediaParent::Secondary(level_id),
                    },
                    created_at: now,
                });
            }
            level
        };
        let primary_level = build_level(LevelKind::Primary, &payload.primary_level);
        let basic_level = build_level(LevelKind::Basic, &payload.basic_level);
        let secondary_level = build_level(LevelKind::Secondary, &payload.secondary_level);

        let school = School {
            record,
            address,
            infrastructure,
            primary_level,
            basic_level,
            secondary_level,
            media: vec![],
        };
        state.schools.insert(id, school.clone());
        Ok(school)
    }

    async fn update(
        &self,
        id: i64,
        changes: &SchoolUpdate,
        editor: &str,
    ) -> Result<School, DatabaseError> {
        let mut state = self.state.write().await;
        let school = state
            .schools
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("School {} not found", id)))?;

        let record = &mut school.record;
        assign_if_present!(record, changes, [
            name,
            phone_number1,
            phone_number2,
            phone_number3,
            email,
            website,
            facebook_url,
            instagram_url,
            logo_url,
            director_name,
            deputy_director_name,
            founded_year,
            description,
            history,
            mission,
            has_uniform,
            uniform_comment,
            has_security,
            security_comment,
            has_psychologist,
            psychologist_comment,
            has_special_needs_support,
            special_needs_comment,
        ]);
        record.updated_by = Some(editor.to_string());
        record.updated_at = Utc::now();

        if let Some(p) = &changes.address {
            school.address = address_from(school.address.id, id, p);
        }
        if let Some(p) = &changes.infrastructure {
            school.infrastructure = infrastructure_from(school.infrastructure.id, id, p);
        }
        for (level, p) in [
            (&mut school.primary_level, &changes.primary_level),
            (&mut school.basic_level, &changes.basic_level),
            (&mut school.secondary_level, &changes.secondary_level),
        ] {
            if let Some(p) = p {
                write_level(level, p);
            }
        }

        Ok(school.clone())
    }

    async fn delete(&self, id: i64) -> Result<School, DatabaseError> {
        self.state
            .write()
            .await
            .schools
            .remove(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("School {} not found", id)))
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn insert_many(&self, items: &[NewMedia]) -> Result<Vec<MediaItem>, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(missing) = items.iter().find(|item| !state.parent_exists(&item.parent)) {
            return Err(DatabaseError::Integrity(format!(
                "{} {} does not exist",
                missing.parent.column(),
                missing.parent.id()
            )));
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let stored = MediaItem {
                id: state.next_id(),
                media_url: item.media_url.clone(),
                description: item.description.clone(),
                media_type: item.media_type,
                parent: item.parent,
                created_at: now,
            };
            state.attach(stored.clone());
            inserted.push(stored);
        }
        Ok(inserted)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn role_of(&self, user_id: &str) -> Result<Option<Role>, DatabaseError> {
        Ok(self.state.read().await.roles.get(user_id).map(|r| r.role))
    }

    async fn assign(&self, user_id: &str, email: &str, role: Role) -> Result<UserRole, DatabaseError> {
        let mut state = self.state.write().await;
        let created_at = state
            .roles
            .get(user_id)
            .map(|r| r.created_at)
            .unwrap_or_else(Utc::now);
        let row = UserRole {
            user_id: user_id.to_string(),
            email: Some(email.to_string()),
            role,
            created_at,
        };
        state.roles.insert(user_id.to_string(), row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::PageRequest;
    use crate::policy::Visibility;

    fn payload(name: &str) -> SchoolPayload {
        SchoolPayload {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_builds_all_children_and_photos() {
        let store = MemoryStore::new();
        let mut p = payload("Alpha");
        p.address.city = Some("Tbilisi".into());
        p.basic_level.photos = vec!["https://img.example.com/a.jpg".into()];

        let school = store.create(&p, "emp-a").await.unwrap();
        assert_eq!(school.owner(), "emp-a");
        assert_eq!(school.address.school_id, school.id());
        assert_eq!(school.basic_level.media.len(), 1);
        assert_eq!(
            school.basic_level.media[0].parent,
            MediaParent::Basic(school.basic_level.id)
        );
        assert!(school.primary_level.media.is_empty());
    }

    #[tokio::test]
    async fn update_leaves_absent_fields_alone() {
        let store = MemoryStore::new();
        let mut p = payload("Alpha");
        p.email = Some("office@alpha.ge".into());
        p.primary_level.price = Some(1200.0);
        let school = store.create(&p, "emp-a").await.unwrap();

        let changes = SchoolUpdate {
            name: Some("Alpha Academy".into()),
            ..Default::default()
        };
        let updated = store.update(school.id(), &changes, "root").await.unwrap();
        assert_eq!(updated.record.name, "Alpha Academy");
        assert_eq!(updated.record.email.as_deref(), Some("office@alpha.ge"));
        assert_eq!(updated.primary_level.price, Some(1200.0));
        assert_eq!(updated.record.updated_by.as_deref(), Some("root"));
        assert_eq!(updated.owner(), "emp-a");
    }

    #[tokio::test]
    async fn media_with_missing_parent_inserts_nothing() {
        let store = MemoryStore::new();
        let school = store.create(&payload("Alpha"), "emp-a").await.unwrap();
        let items = vec![
            NewMedia {
                media_url: "https://img.example.com/1.jpg".into(),
                description: None,
                media_type: MediaKind::Photo,
                parent: MediaParent::School(school.id()),
            },
            NewMedia {
                media_url: "https://img.example.com/2.jpg".into(),
                description: None,
                media_type: MediaKind::Photo,
                parent: MediaParent::Secondary(9_999),
            },
        ];
        assert!(matches!(
            store.insert_many(&items).await,
            Err(DatabaseError::Integrity(_))
        ));
        assert!(store.find(school.id()).await.unwrap().unwrap().media.is_empty());
    }

    #[tokio::test]
    async fn pages_newest_first() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.create(&payload(&format!("School {i}")), "emp-a").await.unwrap();
        }
        let mut query = ListQuery::new(Visibility::All);
        query.page = Some(PageRequest { page: 1, page_size: 2 });
        let page = store.list(&query).await.unwrap();
        let names: Vec<_> = page.iter().map(|s| s.record.name.as_str()).collect();
        assert_eq!(names, vec!["School 4", "School 3"]);
        assert_eq!(store.count(&query).await.unwrap(), 5);
    }
}
