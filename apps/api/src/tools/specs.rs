//! Tool definitions advertised to the model.
//!
//! The schemas mirror the admin panel's CRUD surface plus the contact
//! workflow. Descriptions are written for the model, not for humans: they
//! steer when a tool is picked, so the confirmation ordering between
//! `prepare_talent_message` and the chat-starting tools is spelled out there.

use serde_json::{json, Value};

use crate::llm_client::ToolSpec;

fn paging_params() -> Value {
    json!({
        "type": "object",
        "properties": {
            "page": { "type": "integer", "default": 1 },
            "per_page": { "type": "integer", "default": 10 },
            "search": { "type": "string" }
        }
    })
}

fn id_params(key: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            key: { "type": "integer", "description": description }
        },
        "required": [key]
    })
}

pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        // ── Contact workflow ───────────────────────────────────────────────
        ToolSpec::function(
            "prepare_talent_message",
            "Use this BEFORE sending any message to a talent. It prepares a \
             draft and asks the user for confirmation. Never call \
             start_chat_with_talent or initiate_contact without a confirmed \
             draft.",
            json!({
                "type": "object",
                "properties": {
                    "talent_name": { "type": "string", "description": "Name of the target talent." },
                    "proposed_message": { "type": "string", "description": "Draft message suggested by the assistant." }
                },
                "required": ["talent_name", "proposed_message"]
            }),
        ),
        ToolSpec::function(
            "start_chat_with_talent",
            "Use this ONLY AFTER the user confirmed the prepared message. \
             Creates a new chat session owned by the talent and stores the \
             first message.",
            json!({
                "type": "object",
                "properties": {
                    "talent_id": { "type": "string" },
                    "talent_name": { "type": "string" },
                    "initial_message": { "type": "string" }
                },
                "required": ["talent_id", "talent_name", "initial_message"]
            }),
        ),
        ToolSpec::function(
            "initiate_contact",
            "Registers a talent as a candidate for a job opening AND starts a \
             new chat session with the approved first message. This is the \
             main tool for first contact.",
            json!({
                "type": "object",
                "properties": {
                    "talent_id": { "type": "integer", "description": "Id of the talent being contacted." },
                    "talent_name": { "type": "string", "description": "Name of the talent being contacted." },
                    "chat_user_id": { "type": "string", "description": "Chat id owned by the talent, for example 'id@user_name'." },
                    "job_opening_id": { "type": "integer", "description": "Id of the relevant job opening." },
                    "initial_message": { "type": "string", "description": "First message already approved by the user." }
                },
                "required": ["talent_id", "talent_name", "chat_user_id", "job_opening_id", "initial_message"]
            }),
        ),
        // ── Talent ─────────────────────────────────────────────────────────
        ToolSpec::function("list_talent", "Search or list talents.", paging_params()),
        ToolSpec::function(
            "get_talent_detail",
            "Talent detail by id.",
            id_params("talent_id", "Unique id of the talent."),
        ),
        ToolSpec::function(
            "create_talent",
            "Create a new talent.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "position": { "type": "string" },
                    "birthdate": { "type": "string", "description": "YYYY-MM-DD" },
                    "summary": { "type": "string" },
                    "skills": { "type": "array", "items": { "type": "string" } },
                    "educations": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "school": { "type": "string" },
                                "degree": { "type": "string" },
                                "year": { "type": "integer" }
                            }
                        }
                    }
                },
                "required": ["name", "position", "birthdate", "summary"]
            }),
        ),
        ToolSpec::function(
            "update_talent",
            "Update a talent.",
            json!({
                "type": "object",
                "properties": {
                    "talent_id": { "type": "integer" },
                    "name": { "type": "string" },
                    "position": { "type": "string" },
                    "birthdate": { "type": "string", "description": "YYYY-MM-DD" },
                    "summary": { "type": "string" },
                    "skills": { "type": "array", "items": { "type": "string" } },
                    "educations": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "school": { "type": "string" },
                                "degree": { "type": "string" },
                                "year": { "type": "integer" }
                            }
                        }
                    }
                },
                "required": ["talent_id"]
            }),
        ),
        ToolSpec::function(
            "delete_talent",
            "Delete a talent.",
            id_params("talent_id", "Unique id of the talent to delete."),
        ),
        // ── Candidates ─────────────────────────────────────────────────────
        ToolSpec::function("list_candidates", "List candidates who applied.", paging_params()),
        ToolSpec::function(
            "get_candidate_detail",
            "Candidate detail by id.",
            id_params("candidate_id", "Unique id of the candidate."),
        ),
        ToolSpec::function(
            "create_candidate",
            "Register a talent as a candidate for a job opening.",
            json!({
                "type": "object",
                "properties": {
                    "talent_id": { "type": "integer" },
                    "job_opening_id": { "type": "integer" },
                    "status": { "type": "integer", "description": "Candidate status, for example 1=contacted, 2=interview." },
                    "regist_at": { "type": "string", "description": "YYYY-MM-DD HH:MM:SS" },
                    "interview_schedule": { "type": "string", "description": "YYYY-MM-DD HH:MM:SS" },
                    "notified_at": { "type": "string", "description": "YYYY-MM-DD HH:MM:SS" }
                },
                "required": ["talent_id", "job_opening_id"]
            }),
        ),
        ToolSpec::function(
            "update_candidate",
            "Update a candidate record.",
            json!({
                "type": "object",
                "properties": {
                    "candidate_id": { "type": "integer" },
                    "talent_id": { "type": "integer" },
                    "job_opening_id": { "type": "integer" },
                    "status": { "type": "integer" },
                    "regist_at": { "type": "string" },
                    "interview_schedule": { "type": "string" },
                    "notified_at": { "type": "string" }
                },
                "required": ["candidate_id"]
            }),
        ),
        ToolSpec::function(
            "delete_candidate",
            "Delete a candidate record.",
            id_params("candidate_id", "Unique id of the candidate to delete."),
        ),
        // ── Companies ──────────────────────────────────────────────────────
        ToolSpec::function("list_companies", "List companies.", paging_params()),
        ToolSpec::function(
            "get_company_detail",
            "Company detail by id.",
            id_params("company_id", "Unique id of the company."),
        ),
        ToolSpec::function(
            "create_company",
            "Create a new company.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "status": { "type": "integer" }
                },
                "required": ["name"]
            }),
        ),
        ToolSpec::function(
            "update_company",
            "Update a company.",
            json!({
                "type": "object",
                "properties": {
                    "company_id": { "type": "integer" },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "status": { "type": "integer" }
                },
                "required": ["company_id"]
            }),
        ),
        ToolSpec::function(
            "delete_company",
            "Delete a company.",
            id_params("company_id", "Unique id of the company to delete."),
        ),
        // ── Company properties ─────────────────────────────────────────────
        ToolSpec::function(
            "list_company_properties",
            "List company properties.",
            paging_params(),
        ),
        ToolSpec::function(
            "get_company_property_detail",
            "Company property detail by id.",
            id_params("prop_id", "Unique id of the property."),
        ),
        ToolSpec::function(
            "create_company_property",
            "Create a company property.",
            json!({
                "type": "object",
                "properties": {
                    "company_id": { "type": "integer" },
                    "key": { "type": "string", "description": "Property key, for example 'location' or 'industry'." },
                    "value": { "type": "string" }
                },
                "required": ["company_id", "key", "value"]
            }),
        ),
        ToolSpec::function(
            "update_company_property",
            "Update a company property.",
            json!({
                "type": "object",
                "properties": {
                    "prop_id": { "type": "integer" },
                    "company_id": { "type": "integer" },
                    "key": { "type": "string" },
                    "value": { "type": "string" }
                },
                "required": ["prop_id"]
            }),
        ),
        ToolSpec::function(
            "delete_company_property",
            "Delete a company property.",
            id_params("prop_id", "Unique id of the property to delete."),
        ),
        // ── Job openings ───────────────────────────────────────────────────
        ToolSpec::function("list_job_openings", "List job openings.", paging_params()),
        ToolSpec::function(
            "get_job_opening_detail",
            "Job opening detail by id.",
            id_params("opening_id", "Unique id of the job opening."),
        ),
        ToolSpec::function(
            "create_job_opening",
            "Create a new job opening.",
            json!({
                "type": "object",
                "properties": {
                    "company_id": { "type": "integer" },
                    "title": { "type": "string" },
                    "body": { "type": "string", "description": "Full description of the opening." },
                    "due_date": { "type": "string", "description": "YYYY-MM-DD" },
                    "status": { "type": "integer", "description": "For example 1=active, 0=inactive." }
                },
                "required": ["company_id", "title"]
            }),
        ),
        ToolSpec::function(
            "update_job_opening",
            "Update a job opening.",
            json!({
                "type": "object",
                "properties": {
                    "opening_id": { "type": "integer" },
                    "company_id": { "type": "integer" },
                    "title": { "type": "string" },
                    "body": { "type": "string" },
                    "due_date": { "type": "string" },
                    "status": { "type": "integer" }
                },
                "required": ["opening_id"]
            }),
        ),
        ToolSpec::function(
            "delete_job_opening",
            "Delete a job opening.",
            id_params("opening_id", "Unique id of the job opening to delete."),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_spec_count() {
        assert_eq!(tool_specs().len(), 28);
    }

    #[test]
    fn test_spec_names_are_unique() {
        let specs = tool_specs();
        let names: HashSet<&str> = specs.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn test_every_resource_has_full_crud() {
        let specs = tool_specs();
        let names: HashSet<&str> = specs.iter().map(|s| s.name()).collect();
        for name in [
            "list_talent",
            "get_talent_detail",
            "create_talent",
            "update_talent",
            "delete_talent",
            "list_candidates",
            "get_candidate_detail",
            "create_candidate",
            "update_candidate",
            "delete_candidate",
            "list_companies",
            "get_company_detail",
            "create_company",
            "update_company",
            "delete_company",
            "list_company_properties",
            "get_company_property_detail",
            "create_company_property",
            "update_company_property",
            "delete_company_property",
            "list_job_openings",
            "get_job_opening_detail",
            "create_job_opening",
            "update_job_opening",
            "delete_job_opening",
            "prepare_talent_message",
            "start_chat_with_talent",
            "initiate_contact",
        ] {
            assert!(names.contains(name), "missing tool {name}");
        }
    }

    #[test]
    fn test_create_talent_required_fields() {
        let specs = tool_specs();
        let create = specs.iter().find(|s| s.name() == "create_talent").unwrap();
        let required = create.parameters()["required"].as_array().unwrap();
        let required: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(required, vec!["name", "position", "birthdate", "summary"]);
    }

    #[test]
    fn test_list_tools_take_paging_params() {
        let specs = tool_specs();
        for name in [
            "list_talent",
            "list_candidates",
            "list_companies",
            "list_company_properties",
            "list_job_openings",
        ] {
            let spec = specs.iter().find(|s| s.name() == name).unwrap();
            let props = spec.parameters()["properties"].as_object().unwrap();
            assert!(props.contains_key("page"), "{name} is missing page");
            assert!(props.contains_key("per_page"), "{name} is missing per_page");
            assert!(props.contains_key("search"), "{name} is missing search");
        }
    }
}
