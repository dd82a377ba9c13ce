//! Group-conversation endpoints, including group administration.

use serde::{Deserialize, Serialize};
use tracing::info;

use causerie_shared::{GroupEntry, GroupId, GroupMember, Message, MessageBody, MessageKind, UserRef};

use crate::client::ApiClient;
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
struct GroupListResponse {
    #[serde(default)]
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct GroupResponse {
    group: GroupEntry,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<GroupMember>,
}

#[derive(Serialize)]
struct SendGroupRequest<'a> {
    group_id: GroupId,
    message: &'a str,
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct CreateGroupRequest<'a> {
    name: &'a str,
    members: &'a [UserRef],
}

#[derive(Serialize)]
struct RenameGroupRequest<'a> {
    group_id: GroupId,
    name: &'a str,
}

#[derive(Serialize)]
struct GroupAvatarRequest<'a> {
    group_id: GroupId,
    avatar: &'a str,
}

#[derive(Serialize)]
struct MemberRequest<'a> {
    group_id: GroupId,
    member_uid: &'a UserRef,
}

impl ApiClient {
    /// `GET /group/list`
    pub async fn list_groups(&self) -> Result<Vec<GroupEntry>> {
        let resp: GroupListResponse = self.get_json("/group/list").await?;
        Ok(resp.groups)
    }

    /// `GET /group/messages/{id}`
    pub async fn group_messages(&self, id: GroupId) -> Result<Vec<Message>> {
        let resp: MessagesResponse = self.get_json(&format!("/group/messages/{id}")).await?;
        Ok(resp.messages)
    }

    /// `POST /group/send` — like direct sends, the realtime echo is the
    /// only append path.
    pub async fn send_group_message(&self, id: GroupId, body: &MessageBody) -> Result<()> {
        let _: serde_json::Value = self
            .post_json(
                "/group/send",
                &SendGroupRequest {
                    group_id: id,
                    message: body.text(),
                    kind: body.kind(),
                    url: body.url(),
                },
            )
            .await?;
        Ok(())
    }

    /// `POST /group/create`
    pub async fn create_group(&self, name: &str, members: &[UserRef]) -> Result<GroupEntry> {
        let resp: GroupResponse = self
            .post_json("/group/create", &CreateGroupRequest { name, members })
            .await?;
        info!(group = %resp.group.id, name = %resp.group.name, "Group created");
        Ok(resp.group)
    }

    /// `PUT /group/rename`
    pub async fn rename_group(&self, id: GroupId, name: &str) -> Result<GroupEntry> {
        let resp: GroupResponse = self
            .put_json("/group/rename", &RenameGroupRequest { group_id: id, name })
            .await?;
        Ok(resp.group)
    }

    /// `PUT /group/avatar`
    pub async fn set_group_avatar(&self, id: GroupId, avatar_url: &str) -> Result<GroupEntry> {
        let resp: GroupResponse = self
            .put_json(
                "/group/avatar",
                &GroupAvatarRequest {
                    group_id: id,
                    avatar: avatar_url,
                },
            )
            .await?;
        Ok(resp.group)
    }

    /// `POST /group/add-member`
    pub async fn add_member(&self, id: GroupId, member: &UserRef) -> Result<()> {
        let _: serde_json::Value = self
            .post_json(
                "/group/add-member",
                &MemberRequest {
                    group_id: id,
                    member_uid: member,
                },
            )
            .await?;
        Ok(())
    }

    /// `POST /group/remove-member`
    pub async fn remove_member(&self, id: GroupId, member: &UserRef) -> Result<()> {
        let _: serde_json::Value = self
            .post_json(
                "/group/remove-member",
                &MemberRequest {
                    group_id: id,
                    member_uid: member,
                },
            )
            .await?;
        Ok(())
    }

    /// `GET /group/members/{id}`
    pub async fn group_members(&self, id: GroupId) -> Result<Vec<GroupMember>> {
        let resp: MembersResponse = self.get_json(&format!("/group/members/{id}")).await?;
        Ok(resp.members)
    }
}
