use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{
    DomainError, DomainResult, Page, clean_optional, matches_keyword, paginate,
};

const MAX_MEMBER_AGE: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsidyType {
    MinimumLiving,
    ExtremePoverty,
    TemporaryRelief,
    Disability,
}

impl SubsidyType {
    pub const ALL: [SubsidyType; 4] = [
        SubsidyType::MinimumLiving,
        SubsidyType::ExtremePoverty,
        SubsidyType::TemporaryRelief,
        SubsidyType::Disability,
    ];

    pub fn label_zh(self) -> &'static str {
        match self {
            SubsidyType::MinimumLiving => "最低生活保障",
            SubsidyType::ExtremePoverty => "特困人员供养",
            SubsidyType::TemporaryRelief => "临时救助",
            SubsidyType::Disability => "残疾人补贴",
        }
    }

    /// Accepts the Chinese label, a common short form, or the snake_case key.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "最低生活保障" | "低保" | "minimum_living" => Some(SubsidyType::MinimumLiving),
            "特困人员供养" | "特困" | "extreme_poverty" => Some(SubsidyType::ExtremePoverty),
            "临时救助" | "temporary_relief" => Some(SubsidyType::TemporaryRelief),
            "残疾人补贴" | "残补" | "disability" => Some(SubsidyType::Disability),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl FamilyStatus {
    pub const ALL: [FamilyStatus; 4] = [
        FamilyStatus::Pending,
        FamilyStatus::Approved,
        FamilyStatus::Rejected,
        FamilyStatus::Suspended,
    ];

    pub fn label_zh(self) -> &'static str {
        match self {
            FamilyStatus::Pending => "待审核",
            FamilyStatus::Approved => "已通过",
            FamilyStatus::Rejected => "已驳回",
            FamilyStatus::Suspended => "已暂停",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
    Suspend,
    Resubmit,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub name: String,
    pub relation: String,
    pub age: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Family {
    pub id: Uuid,
    pub household_head: String,
    pub id_number: String,
    pub phone: String,
    pub region: String,
    pub address: String,
    pub members: Vec<FamilyMember>,
    pub monthly_income: f64,
    pub subsidy_type: SubsidyType,
    pub subsidy_amount: f64,
    pub status: FamilyStatus,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Family {
    /// The head of household counts toward the household size.
    pub fn household_size(&self) -> usize {
        self.members.len() + 1
    }

    pub fn per_capita_income(&self) -> f64 {
        self.monthly_income / self.household_size() as f64
    }
}

/// Family plus derived figures, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyView {
    #[serde(flatten)]
    pub family: Family,
    pub household_size: usize,
    pub per_capita_income: f64,
}

impl From<&Family> for FamilyView {
    fn from(family: &Family) -> Self {
        Self {
            household_size: family.household_size(),
            per_capita_income: round_cents(family.per_capita_income()),
            family: family.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FamilyInput {
    pub household_head: String,
    pub id_number: String,
    pub phone: String,
    pub region: String,
    #[serde(default)]
    pub address: String,
    pub monthly_income: f64,
    pub subsidy_type: SubsidyType,
    #[serde(default)]
    pub subsidy_amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyPatch {
    #[serde(default)]
    pub household_head: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub subsidy_type: Option<SubsidyType>,
    #[serde(default)]
    pub subsidy_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberInput {
    pub name: String,
    #[serde(default)]
    pub relation: String,
    pub age: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyQuery {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub status: Option<FamilyStatus>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub subsidy_type: Option<SubsidyType>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Default)]
pub struct FamilyRegistry {
    families: Vec<Family>,
}

impl FamilyRegistry {
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn all(&self) -> &[Family] {
        &self.families
    }

    /// Filters newest first and returns one page of results.
    pub fn search(&self, query: &FamilyQuery) -> Page<FamilyView> {
        let region = query.region.as_deref().map(str::trim).filter(|r| !r.is_empty());

        let mut matches: Vec<&Family> = self
            .families
            .iter()
            .filter(|family| query.status.is_none_or(|status| family.status == status))
            .filter(|family| region.is_none_or(|region| family.region == region))
            .filter(|family| {
                query
                    .subsidy_type
                    .is_none_or(|kind| family.subsidy_type == kind)
            })
            .filter(|family| {
                query.keyword.as_deref().is_none_or(|keyword| {
                    matches_keyword(
                        keyword,
                        &[
                            &family.household_head,
                            &family.phone,
                            &family.region,
                            &family.address,
                        ],
                    )
                })
            })
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let views = matches.into_iter().map(FamilyView::from).collect();
        paginate(views, query.page, query.page_size)
    }

    pub fn get(&self, id: Uuid) -> DomainResult<&Family> {
        self.families
            .iter()
            .find(|family| family.id == id)
            .ok_or(DomainError::NotFound("未找到该家庭档案。"))
    }

    fn get_mut(&mut self, id: Uuid) -> DomainResult<&mut Family> {
        self.families
            .iter_mut()
            .find(|family| family.id == id)
            .ok_or(DomainError::NotFound("未找到该家庭档案。"))
    }

    pub fn create(&mut self, input: FamilyInput, now: DateTime<Utc>) -> DomainResult<Family> {
        let household_head = required_text(&input.household_head, "请填写户主姓名。")?;
        let id_number = normalize_id_number(&input.id_number)?;
        let phone = normalize_phone(&input.phone)?;
        let region = required_text(&input.region, "请填写所属地区。")?;
        let monthly_income = non_negative(input.monthly_income, "月收入")?;
        let subsidy_amount = non_negative(input.subsidy_amount, "补贴金额")?;
        self.ensure_unique_id_number(&id_number, None)?;

        let family = Family {
            id: Uuid::new_v4(),
            household_head,
            id_number,
            phone,
            region,
            address: input.address.trim().to_string(),
            members: Vec::new(),
            monthly_income,
            subsidy_type: input.subsidy_type,
            subsidy_amount,
            status: FamilyStatus::Pending,
            review_note: None,
            created_at: now,
            updated_at: now,
        };
        self.families.push(family.clone());
        Ok(family)
    }

    pub fn update(
        &mut self,
        id: Uuid,
        patch: FamilyPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<Family> {
        self.get(id)?;

        let household_head = patch
            .household_head
            .as_deref()
            .map(|value| required_text(value, "请填写户主姓名。"))
            .transpose()?;
        let id_number = patch
            .id_number
            .as_deref()
            .map(normalize_id_number)
            .transpose()?;
        let phone = patch.phone.as_deref().map(normalize_phone).transpose()?;
        let region = patch
            .region
            .as_deref()
            .map(|value| required_text(value, "请填写所属地区。"))
            .transpose()?;
        let monthly_income = patch
            .monthly_income
            .map(|value| non_negative(value, "月收入"))
            .transpose()?;
        let subsidy_amount = patch
            .subsidy_amount
            .map(|value| non_negative(value, "补贴金额"))
            .transpose()?;
        if let Some(id_number) = &id_number {
            self.ensure_unique_id_number(id_number, Some(id))?;
        }

        let family = self.get_mut(id)?;
        if let Some(value) = household_head {
            family.household_head = value;
        }
        if let Some(value) = id_number {
            family.id_number = value;
        }
        if let Some(value) = phone {
            family.phone = value;
        }
        if let Some(value) = region {
            family.region = value;
        }
        if let Some(value) = patch.address {
            family.address = value.trim().to_string();
        }
        if let Some(value) = monthly_income {
            family.monthly_income = value;
        }
        if let Some(value) = patch.subsidy_type {
            family.subsidy_type = value;
        }
        if let Some(value) = subsidy_amount {
            family.subsidy_amount = value;
        }
        family.updated_at = now;
        Ok(family.clone())
    }

    pub fn delete(&mut self, id: Uuid) -> DomainResult<Family> {
        let index = self
            .families
            .iter()
            .position(|family| family.id == id)
            .ok_or(DomainError::NotFound("未找到该家庭档案。"))?;
        Ok(self.families.remove(index))
    }

    pub fn add_member(
        &mut self,
        id: Uuid,
        input: MemberInput,
        now: DateTime<Utc>,
    ) -> DomainResult<FamilyMember> {
        let name = required_text(&input.name, "请填写成员姓名。")?;
        if input.age > MAX_MEMBER_AGE {
            return Err(DomainError::invalid(format!(
                "成员年龄需在 0-{MAX_MEMBER_AGE} 之间。"
            )));
        }
        let relation = clean_optional(Some(&input.relation)).unwrap_or_else(|| "其他".to_string());

        let family = self.get_mut(id)?;
        let member = FamilyMember {
            id: Uuid::new_v4(),
            name,
            relation,
            age: input.age,
        };
        family.members.push(member.clone());
        family.updated_at = now;
        Ok(member)
    }

    pub fn remove_member(
        &mut self,
        id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let family = self.get_mut(id)?;
        let before = family.members.len();
        family.members.retain(|member| member.id != member_id);
        if family.members.len() == before {
            return Err(DomainError::NotFound("未找到该家庭成员。"));
        }
        family.updated_at = now;
        Ok(())
    }

    /// Applies a review decision. Rejections and suspensions must explain themselves.
    pub fn review(
        &mut self,
        id: Uuid,
        action: ReviewAction,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<Family> {
        let note = clean_optional(note);
        let family = self.get_mut(id)?;

        let next = match (family.status, action) {
            (FamilyStatus::Pending, ReviewAction::Approve) => FamilyStatus::Approved,
            (FamilyStatus::Pending, ReviewAction::Reject) => FamilyStatus::Rejected,
            (FamilyStatus::Approved, ReviewAction::Suspend) => FamilyStatus::Suspended,
            (FamilyStatus::Suspended, ReviewAction::Approve) => FamilyStatus::Approved,
            (FamilyStatus::Rejected, ReviewAction::Resubmit) => FamilyStatus::Pending,
            (current, _) => {
                return Err(DomainError::invalid(format!(
                    "当前状态（{}）不允许该操作。",
                    current.label_zh()
                )));
            }
        };

        if matches!(action, ReviewAction::Reject | ReviewAction::Suspend) && note.is_none() {
            return Err(DomainError::invalid("驳回或暂停时必须填写审核意见。"));
        }

        family.status = next;
        family.review_note = note;
        family.updated_at = now;
        Ok(family.clone())
    }

    fn ensure_unique_id_number(&self, id_number: &str, except: Option<Uuid>) -> DomainResult<()> {
        let clash = self
            .families
            .iter()
            .any(|family| Some(family.id) != except && family.id_number == id_number);
        if clash {
            return Err(DomainError::Conflict("该身份证号已登记家庭档案。".to_string()));
        }
        Ok(())
    }
}

fn required_text(value: &str, message: &'static str) -> DomainResult<String> {
    clean_optional(Some(value)).ok_or_else(|| DomainError::invalid(message))
}

/// 18 characters: 17 digits followed by a digit or `X`.
pub fn normalize_id_number(raw: &str) -> DomainResult<String> {
    let value = raw.trim().to_ascii_uppercase();
    let valid = value.len() == 18
        && value
            .char_indices()
            .all(|(idx, ch)| ch.is_ascii_digit() || (idx == 17 && ch == 'X'));
    if !valid {
        return Err(DomainError::invalid("身份证号格式不正确。"));
    }
    Ok(value)
}

/// Mainland mobile numbers: 11 digits starting with `1`.
pub fn normalize_phone(raw: &str) -> DomainResult<String> {
    let value = raw.trim();
    let valid = value.len() == 11
        && value.starts_with('1')
        && value.chars().all(|ch| ch.is_ascii_digit());
    if !valid {
        return Err(DomainError::invalid("联系电话需为 11 位手机号码。"));
    }
    Ok(value.to_string())
}

fn non_negative(value: f64, field: &str) -> DomainResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::invalid(format!("{field}不能为负数。")));
    }
    Ok(value)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn input(head: &str, id_number: &str) -> FamilyInput {
        FamilyInput {
            household_head: head.to_string(),
            id_number: id_number.to_string(),
            phone: "13800138000".to_string(),
            region: "东城街道".to_string(),
            address: "幸福路 1 号".to_string(),
            monthly_income: 1800.0,
            subsidy_type: SubsidyType::MinimumLiving,
            subsidy_amount: 650.0,
        }
    }

    #[test]
    fn create_validates_fields() {
        let mut registry = FamilyRegistry::default();
        let now = Utc::now();

        assert!(registry.create(input(" ", "110101199001011234"), now).is_err());
        assert!(registry.create(input("张三", "12345"), now).is_err());

        let mut bad_phone = input("张三", "110101199001011234");
        bad_phone.phone = "2380013800".to_string();
        assert!(registry.create(bad_phone, now).is_err());

        let mut negative = input("张三", "110101199001011234");
        negative.monthly_income = -1.0;
        assert!(registry.create(negative, now).is_err());

        let family = registry
            .create(input("张三", "11010119900101123x"), now)
            .unwrap();
        assert_eq!(family.id_number, "11010119900101123X");
        assert_eq!(family.status, FamilyStatus::Pending);

        assert!(matches!(
            registry.create(input("李四", "11010119900101123X"), now),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn members_drive_household_size_and_per_capita_income() {
        let mut registry = FamilyRegistry::default();
        let now = Utc::now();
        let family = registry
            .create(input("王五", "110101198001011111"), now)
            .unwrap();

        let member = registry
            .add_member(
                family.id,
                MemberInput {
                    name: "王小五".to_string(),
                    relation: "子女".to_string(),
                    age: 9,
                },
                now,
            )
            .unwrap();
        registry
            .add_member(
                family.id,
                MemberInput {
                    name: "赵六".to_string(),
                    relation: String::new(),
                    age: 40,
                },
                now,
            )
            .unwrap();

        let stored = registry.get(family.id).unwrap();
        assert_eq!(stored.household_size(), 3);
        assert!((stored.per_capita_income() - 600.0).abs() < 1e-9);
        assert_eq!(stored.members[1].relation, "其他");

        registry.remove_member(family.id, member.id, now).unwrap();
        assert!(matches!(
            registry.remove_member(family.id, member.id, now),
            Err(DomainError::NotFound(_))
        ));
        assert!(registry
            .add_member(
                family.id,
                MemberInput {
                    name: "老人".to_string(),
                    relation: "父母".to_string(),
                    age: 151,
                },
                now,
            )
            .is_err());
    }

    #[test]
    fn review_follows_allowed_transitions() {
        let mut registry = FamilyRegistry::default();
        let now = Utc::now();
        let family = registry
            .create(input("孙七", "110101197001012222"), now)
            .unwrap();

        assert!(registry
            .review(family.id, ReviewAction::Suspend, Some("材料不全"), now)
            .is_err());
        assert!(registry
            .review(family.id, ReviewAction::Reject, None, now)
            .is_err());

        let approved = registry
            .review(family.id, ReviewAction::Approve, None, now)
            .unwrap();
        assert_eq!(approved.status, FamilyStatus::Approved);

        let suspended = registry
            .review(family.id, ReviewAction::Suspend, Some("收入超标"), now)
            .unwrap();
        assert_eq!(suspended.status, FamilyStatus::Suspended);
        assert_eq!(suspended.review_note.as_deref(), Some("收入超标"));

        let restored = registry
            .review(family.id, ReviewAction::Approve, None, now)
            .unwrap();
        assert_eq!(restored.status, FamilyStatus::Approved);
        assert!(restored.review_note.is_none());
    }

    #[test]
    fn rejected_families_can_resubmit() {
        let mut registry = FamilyRegistry::default();
        let now = Utc::now();
        let family = registry
            .create(input("周八", "110101197001013333"), now)
            .unwrap();

        registry
            .review(family.id, ReviewAction::Reject, Some("收入证明缺失"), now)
            .unwrap();
        let pending = registry
            .review(family.id, ReviewAction::Resubmit, None, now)
            .unwrap();
        assert_eq!(pending.status, FamilyStatus::Pending);
    }

    #[test]
    fn search_filters_sorts_and_paginates() {
        let mut registry = FamilyRegistry::default();
        let base = Utc::now();

        for idx in 0..12 {
            let mut family = input(&format!("户主{idx}"), &format!("1101011990010100{idx:02}"));
            if idx % 2 == 0 {
                family.region = "西城街道".to_string();
            }
            registry
                .create(family, base + Duration::minutes(idx))
                .unwrap();
        }

        let west = registry.search(&FamilyQuery {
            region: Some("西城街道".to_string()),
            ..FamilyQuery::default()
        });
        assert_eq!(west.total, 6);
        assert_eq!(west.items[0].family.household_head, "户主10");

        let second_page = registry.search(&FamilyQuery {
            page: Some(2),
            page_size: Some(5),
            ..FamilyQuery::default()
        });
        assert_eq!(second_page.total, 12);
        assert_eq!(second_page.items.len(), 5);
        assert_eq!(second_page.items[0].family.household_head, "户主6");

        let keyword = registry.search(&FamilyQuery {
            keyword: Some("户主11".to_string()),
            ..FamilyQuery::default()
        });
        assert_eq!(keyword.total, 1);
        assert_eq!(keyword.items[0].household_size, 1);
    }

    #[test]
    fn update_keeps_id_numbers_unique() {
        let mut registry = FamilyRegistry::default();
        let now = Utc::now();
        let first = registry
            .create(input("甲", "110101199001010001"), now)
            .unwrap();
        registry
            .create(input("乙", "110101199001010002"), now)
            .unwrap();

        let clash = FamilyPatch {
            id_number: Some("110101199001010002".to_string()),
            ..FamilyPatch::default()
        };
        assert!(matches!(
            registry.update(first.id, clash, now),
            Err(DomainError::Conflict(_))
        ));

        let updated = registry
            .update(
                first.id,
                FamilyPatch {
                    id_number: Some("110101199001010001".to_string()),
                    monthly_income: Some(900.0),
                    ..FamilyPatch::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(updated.monthly_income, 900.0);
    }

    #[test]
    fn subsidy_type_parses_labels_and_keys() {
        assert_eq!(SubsidyType::parse("低保"), Some(SubsidyType::MinimumLiving));
        assert_eq!(
            SubsidyType::parse(" 临时救助 "),
            Some(SubsidyType::TemporaryRelief)
        );
        assert_eq!(SubsidyType::parse("disability"), Some(SubsidyType::Disability));
        assert_eq!(SubsidyType::parse("未知"), None);
    }
}
