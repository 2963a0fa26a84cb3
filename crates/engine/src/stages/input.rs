// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{StageFuture, Stages};
use crate::render::{render_request, render_value};
use serde_json::{Map, Value};
use wx_adapters::{DataSource, Query, ScriptEngine};
use wx_core::execution::as_payload;
use wx_core::{ExecutionContext, InputDef};

impl<D: DataSource, E: ScriptEngine> Stages<D, E> {
    /// Produce a payload.
    ///
    /// `payload` is what templates see as `ctx.payload`: empty for the
    /// watch input, the results gathered so far inside a chain.
    pub fn input<'a>(
        &'a self,
        def: &'a InputDef,
        ctx: &'a ExecutionContext,
        payload: &'a Value,
    ) -> StageFuture<'a> {
        Box::pin(async move {
            match def {
                InputDef::None => Ok(Value::Object(Map::new())),
                InputDef::Simple { payload } => Ok(Value::Object(payload.clone())),
                InputDef::Search {
                    indices,
                    body,
                    timeout,
                } => {
                    let model = ctx.model_with_payload(payload);
                    let body = render_value(&self.scripts, "body", body, &model)?;
                    let query = Query::Search {
                        indices: indices.clone(),
                        body,
                    };
                    Ok(as_payload(self.query(query, *timeout).await?))
                }
                InputDef::Http { request, timeout } => {
                    let model = ctx.model_with_payload(payload);
                    let request = render_request(&self.scripts, request, &model)?;
                    let query = Query::Http { request };
                    Ok(as_payload(self.query(query, *timeout).await?))
                }
                InputDef::Chain { inputs } => {
                    let mut gathered = Value::Object(Map::new());
                    for named in inputs {
                        let result = self.input(&named.input, ctx, &gathered).await?;
                        if let Value::Object(map) = &mut gathered {
                            map.insert(named.name.clone(), result);
                        }
                    }
                    Ok(gathered)
                }
            }
        })
    }
}
