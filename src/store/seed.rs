use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use super::{MockStore, NewAccount};
use crate::{
    config::AppConfig,
    modules::{
        announcements::{AnnouncementCategory, AnnouncementDraft},
        api_docs::{ApiEndpointInput, ApiParamDoc, ParamLocation},
        families::{FamilyInput, MemberInput, ReviewAction, SubsidyType},
        messages::MessageSubmission,
        notifications::NotificationLevel,
    },
};

pub(super) fn seed_admin(store: &mut MockStore, config: &AppConfig) -> Result<()> {
    store
        .accounts
        .create(
            NewAccount {
                username: &config.admin_username,
                display_name: Some("系统管理员"),
                password: &config.admin_password,
                is_admin: true,
            },
            Utc::now(),
        )
        .context("failed to create the administrator account")?;
    Ok(())
}

type ParamRow = (&'static str, ParamLocation, bool, &'static str);

struct EndpointSeed {
    method: &'static str,
    path: &'static str,
    tag: &'static str,
    summary: &'static str,
    params: &'static [ParamRow],
}

const ID_PARAM: ParamRow = ("id", ParamLocation::Path, true, "资源编号（UUID）");

const ENDPOINTS: &[EndpointSeed] = &[
    EndpointSeed {
        method: "POST",
        path: "/api/auth/login",
        tag: "认证",
        summary: "账号密码登录，成功后写入会话 Cookie",
        params: &[
            ("username", ParamLocation::Body, true, "用户名"),
            ("password", ParamLocation::Body, true, "密码"),
        ],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/auth/me",
        tag: "认证",
        summary: "获取当前登录用户",
        params: &[],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/families",
        tag: "家庭管理",
        summary: "分页查询家庭档案",
        params: &[
            ("keyword", ParamLocation::Query, false, "按户主、电话、地区或住址搜索"),
            ("status", ParamLocation::Query, false, "审核状态"),
            ("region", ParamLocation::Query, false, "所属地区"),
            ("page", ParamLocation::Query, false, "页码，从 1 开始"),
            ("page_size", ParamLocation::Query, false, "每页条数，默认 10"),
        ],
    },
    EndpointSeed {
        method: "POST",
        path: "/api/families",
        tag: "家庭管理",
        summary: "登记家庭档案",
        params: &[
            ("household_head", ParamLocation::Body, true, "户主姓名"),
            ("id_number", ParamLocation::Body, true, "18 位身份证号"),
            ("phone", ParamLocation::Body, true, "11 位手机号码"),
            ("region", ParamLocation::Body, true, "所属地区"),
            ("monthly_income", ParamLocation::Body, true, "家庭月收入"),
            ("subsidy_type", ParamLocation::Body, true, "救助类型"),
        ],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/families/:id",
        tag: "家庭管理",
        summary: "查看家庭档案详情",
        params: &[ID_PARAM],
    },
    EndpointSeed {
        method: "POST",
        path: "/api/families/:id/review",
        tag: "家庭管理",
        summary: "审核家庭档案",
        params: &[
            ID_PARAM,
            ("action", ParamLocation::Body, true, "approve / reject / suspend / resubmit"),
            ("note", ParamLocation::Body, false, "审核意见，驳回或暂停时必填"),
        ],
    },
    EndpointSeed {
        method: "POST",
        path: "/api/families/import",
        tag: "家庭管理",
        summary: "通过 Excel 批量导入家庭档案",
        params: &[("file", ParamLocation::Body, true, "multipart 上传的 .xlsx 文件")],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/announcements",
        tag: "公告",
        summary: "查询公告列表",
        params: &[
            ("status", ParamLocation::Query, false, "draft / published / archived"),
            ("category", ParamLocation::Query, false, "policy / notice / event"),
        ],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/public/announcements",
        tag: "公告",
        summary: "公开的已发布公告",
        params: &[],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/reports/overview",
        tag: "统计报表",
        summary: "统计概览",
        params: &[("region", ParamLocation::Query, false, "按地区筛选")],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/reports/export.xlsx",
        tag: "统计报表",
        summary: "导出统计报表",
        params: &[("region", ParamLocation::Query, false, "按地区筛选")],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/notifications",
        tag: "消息通知",
        summary: "当前用户的通知列表",
        params: &[("unread_only", ParamLocation::Query, false, "仅返回未读通知")],
    },
    EndpointSeed {
        method: "POST",
        path: "/api/public/messages",
        tag: "群众留言",
        summary: "提交留言（受频率与敏感词限制）",
        params: &[
            ("name", ParamLocation::Body, true, "称呼，1-20 个字符"),
            ("contact", ParamLocation::Body, false, "联系方式"),
            ("content", ParamLocation::Body, true, "留言内容，最多 500 个字符"),
        ],
    },
    EndpointSeed {
        method: "GET",
        path: "/api/maintenance",
        tag: "系统",
        summary: "查询维护模式状态",
        params: &[],
    },
    EndpointSeed {
        method: "PUT",
        path: "/api/maintenance",
        tag: "系统",
        summary: "开启或关闭维护模式（管理员）",
        params: &[
            ("enabled", ParamLocation::Body, true, "是否开启"),
            ("message", ParamLocation::Body, false, "维护提示语"),
        ],
    },
];

pub(super) fn seed_api_docs(store: &mut MockStore) -> Result<()> {
    let now = Utc::now();
    for endpoint in ENDPOINTS {
        let sample_response = match (endpoint.method, endpoint.path) {
            ("GET", "/api/auth/me") => Some(json!({
                "id": "6f1c2d9e-0000-4000-8000-000000000001",
                "username": "admin",
                "display_name": "系统管理员",
                "is_admin": true
            })),
            ("GET", "/api/maintenance") => Some(json!({
                "enabled": false,
                "message": "系统正在维护升级，暂停对外服务。"
            })),
            ("POST", "/api/public/messages") => Some(json!({ "message": "留言已提交，我们会尽快回复。" })),
            _ => None,
        };

        store
            .api_docs
            .create(
                ApiEndpointInput {
                    method: endpoint.method.to_string(),
                    path: endpoint.path.to_string(),
                    summary: endpoint.summary.to_string(),
                    description: None,
                    tag: endpoint.tag.to_string(),
                    params: endpoint
                        .params
                        .iter()
                        .map(|&(name, location, required, description)| ApiParamDoc {
                            name: name.to_string(),
                            location,
                            required,
                            description: description.to_string(),
                        })
                        .collect(),
                    sample_response,
                    deprecated: false,
                },
                now,
            )
            .with_context(|| {
                format!("failed to seed docs for {} {}", endpoint.method, endpoint.path)
            })?;
    }
    Ok(())
}

struct FamilySeed {
    head: &'static str,
    id_number: &'static str,
    phone: &'static str,
    region: &'static str,
    address: &'static str,
    income: f64,
    subsidy_type: SubsidyType,
    amount: f64,
    days_ago: i64,
    members: &'static [(&'static str, &'static str, u32)],
    review: Option<(ReviewAction, Option<&'static str>)>,
}

const FAMILIES: &[FamilySeed] = &[
    FamilySeed {
        head: "张建国",
        id_number: "110101196505120011",
        phone: "13800010001",
        region: "东城街道",
        address: "和平里北街 12 号",
        income: 1800.0,
        subsidy_type: SubsidyType::MinimumLiving,
        amount: 860.0,
        days_ago: 150,
        members: &[("李秀兰", "配偶", 58), ("张晓明", "子女", 16)],
        review: Some((ReviewAction::Approve, None)),
    },
    FamilySeed {
        head: "王桂芝",
        id_number: "110101195203150024",
        phone: "13800010002",
        region: "东城街道",
        address: "东四十条 8 号院",
        income: 900.0,
        subsidy_type: SubsidyType::ExtremePoverty,
        amount: 1200.0,
        days_ago: 120,
        members: &[],
        review: Some((ReviewAction::Approve, None)),
    },
    FamilySeed {
        head: "刘志强",
        id_number: "11010219780808003X",
        phone: "13800010003",
        region: "西城街道",
        address: "新街口外大街 21 号",
        income: 2600.0,
        subsidy_type: SubsidyType::Disability,
        amount: 300.0,
        days_ago: 95,
        members: &[("刘小雨", "子女", 9)],
        review: Some((ReviewAction::Approve, None)),
    },
    FamilySeed {
        head: "陈美华",
        id_number: "110102198011110046",
        phone: "13800010004",
        region: "西城街道",
        address: "白纸坊东街 3 号",
        income: 4200.0,
        subsidy_type: SubsidyType::MinimumLiving,
        amount: 0.0,
        days_ago: 60,
        members: &[("周杰", "配偶", 45)],
        review: Some((ReviewAction::Reject, Some("家庭人均收入高于当地低保标准。"))),
    },
    FamilySeed {
        head: "赵德明",
        id_number: "110105197002020057",
        phone: "13800010005",
        region: "南湖社区",
        address: "南湖西里 5 号楼",
        income: 1500.0,
        subsidy_type: SubsidyType::MinimumLiving,
        amount: 720.0,
        days_ago: 40,
        members: &[("赵婷", "子女", 12), ("孙玉珍", "父母", 81)],
        review: Some((ReviewAction::Approve, None)),
    },
    FamilySeed {
        head: "孙丽娟",
        id_number: "110105198506060068",
        phone: "13800010006",
        region: "南湖社区",
        address: "南湖中园 2 号",
        income: 1100.0,
        subsidy_type: SubsidyType::TemporaryRelief,
        amount: 1500.0,
        days_ago: 18,
        members: &[("孙浩", "子女", 6)],
        review: None,
    },
    FamilySeed {
        head: "周永福",
        id_number: "110106195809090079",
        phone: "13800010007",
        region: "北关社区",
        address: "北关路 17 号",
        income: 700.0,
        subsidy_type: SubsidyType::ExtremePoverty,
        amount: 1100.0,
        days_ago: 7,
        members: &[],
        review: None,
    },
    FamilySeed {
        head: "吴海燕",
        id_number: "110106199012120081",
        phone: "13800010008",
        region: "北关社区",
        address: "北关新村 9 栋",
        income: 2000.0,
        subsidy_type: SubsidyType::Disability,
        amount: 260.0,
        days_ago: 2,
        members: &[("吴军", "配偶", 36)],
        review: None,
    },
];

pub(super) fn seed_mock_data(store: &mut MockStore, now: DateTime<Utc>) -> Result<()> {
    for seed in FAMILIES {
        let created_at = now - Duration::days(seed.days_ago);
        let family = store
            .families
            .create(
                FamilyInput {
                    household_head: seed.head.to_string(),
                    id_number: seed.id_number.to_string(),
                    phone: seed.phone.to_string(),
                    region: seed.region.to_string(),
                    address: seed.address.to_string(),
                    monthly_income: seed.income,
                    subsidy_type: seed.subsidy_type,
                    subsidy_amount: seed.amount,
                },
                created_at,
            )
            .with_context(|| format!("failed to seed family {}", seed.head))?;

        for &(name, relation, age) in seed.members {
            store.families.add_member(
                family.id,
                MemberInput {
                    name: name.to_string(),
                    relation: relation.to_string(),
                    age,
                },
                created_at,
            )?;
        }
        if let Some((action, note)) = seed.review {
            store
                .families
                .review(family.id, action, note, created_at + Duration::days(3))?;
        }
    }

    // The suspended example goes through approval first.
    let suspended = store
        .families
        .all()
        .iter()
        .find(|family| family.household_head == "刘志强")
        .map(|family| family.id);
    if let Some(id) = suspended {
        store.families.review(
            id,
            ReviewAction::Suspend,
            Some("残疾等级复核中，暂停发放。"),
            now - Duration::days(5),
        )?;
    }

    let announcements = [
        AnnouncementDraft {
            title: "关于调整城乡最低生活保障标准的通知".to_string(),
            content: "自本月起，城乡低保标准统一上调至每人每月 1395 元，请各街道做好核算与发放工作。".to_string(),
            category: AnnouncementCategory::Policy,
            pinned: true,
            publish: true,
        },
        AnnouncementDraft {
            title: "年度救助对象复核工作安排".to_string(),
            content: "请各社区于月底前完成在册救助家庭的入户复核，并在系统中更新家庭成员与收入信息。".to_string(),
            category: AnnouncementCategory::Notice,
            pinned: false,
            publish: true,
        },
        AnnouncementDraft {
            title: "社会救助政策宣传周活动预告".to_string(),
            content: "宣传周期间将在各社区设置咨询点，现场解答低保、特困及临时救助申请问题。".to_string(),
            category: AnnouncementCategory::Event,
            pinned: false,
            publish: false,
        },
    ];
    for (offset, draft) in announcements.into_iter().enumerate() {
        store
            .announcements
            .create(draft, "系统管理员", now - Duration::days(10 - offset as i64 * 3))?;
    }

    store.notifications.broadcast(
        "欢迎使用社会救助家庭管理平台",
        "系统已载入演示数据，可在管理后台维护账号与维护模式。",
        NotificationLevel::Info,
        now - Duration::days(1),
    );
    store.notifications.broadcast(
        "本月救助资金发放提醒",
        "请于 25 日前完成本月救助资金发放名单的核对。",
        NotificationLevel::Warning,
        now,
    );

    let messages = [
        ("张女士", Some("13912345678"), "请问临时救助需要准备哪些材料？"),
        ("热心居民", None, "建议在社区服务站张贴低保申请流程。"),
    ];
    for (offset, (name, contact, content)) in messages.into_iter().enumerate() {
        store.messages.submit(
            MessageSubmission {
                name: name.to_string(),
                contact: contact.map(str::to_string),
                content: content.to_string(),
            },
            "127.0.0.1",
            now - Duration::hours(6 * (offset as i64 + 1)),
        )?;
    }

    Ok(())
}
